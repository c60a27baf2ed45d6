use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};

use crate::api::auth::MaybeUser;
use crate::api::response::{AttachmentResp, Envelope};
use crate::api::AppState;
use crate::errors::{Error, Result};
use crate::usecases::attachment::upload;

fn multipart_err(e: axum::extract::multipart::MultipartError) -> Error {
    Error::InvalidArgument(e.to_string())
}

/// Multipart form with a `file_type` text field and a `file` part.
pub async fn upload(
    State(app): State<AppState>,
    _: MaybeUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Envelope<AttachmentResp>> {
    let mut multipart = multipart?;

    let mut file_type = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file_type") => file_type = Some(field.text().await.map_err(multipart_err)?),
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let body = field.bytes().await.map_err(multipart_err)?;
                file = Some((filename, body));
            },
            _ => (),
        }
    }

    let (filename, body) =
        file.ok_or_else(|| Error::InvalidArgument("receive file failed".to_string()))?;

    let upload::Output { attachment, url } = app
        .upload
        .handle(upload::Input {
            file_type: file_type.unwrap_or_default(),
            filename,
            body,
        })
        .await?;

    Ok(Envelope::ok(AttachmentResp::new(attachment, url)))
}
