use core::future::Future;

use crate::errors::Result;

pub const DEFAULT_PER_PAGE: u64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, ::serde::Deserialize)]
pub struct OffsetParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub per_page: i64,
}

impl OffsetParams {
    pub fn new(page: i64, per_page: i64) -> Self { Self { page, per_page } }

    pub fn page(&self) -> u64 { self.page.max(1) as u64 }

    pub fn per_page(&self) -> u64 {
        match self.per_page {
            n if n < 1 => DEFAULT_PER_PAGE,
            n => n as u64,
        }
    }

    /// Capped at `i64::MAX`, the largest skip a store accepts. A page far past the end reads
    /// as empty.
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.per_page())
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize)]
pub struct OffsetPagination {
    pub total_records: u64,
    pub total_pages: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl OffsetPagination {
    pub fn new(params: &OffsetParams, total_records: u64) -> Self {
        let per_page = params.per_page();

        Self {
            total_records,
            total_pages: total_records.div_ceil(per_page),
            per_page,
            current_page: params.page(),
        }
    }
}

/// Counts first, then fetches the requested slice with `(skip, limit)`.
pub async fn paginate<T, C, CFut, F, FFut>(
    params: &OffsetParams,
    count: C,
    fetch: F,
) -> Result<(Vec<T>, OffsetPagination)>
where
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<u64>>,
    F: FnOnce(u64, u64) -> FFut,
    FFut: Future<Output = Result<Vec<T>>>,
{
    let total = count().await?;
    let items = fetch(params.offset(), params.per_page()).await?;

    Ok((items, OffsetPagination::new(params, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_round_up() {
        let p = OffsetParams::new(1, 3);
        assert_eq!(OffsetPagination::new(&p, 8).total_pages, 3);
        assert_eq!(OffsetPagination::new(&p, 9).total_pages, 3);
        assert_eq!(OffsetPagination::new(&p, 10).total_pages, 4);
        assert_eq!(OffsetPagination::new(&p, 0).total_pages, 0);
    }

    #[test]
    fn zero_inputs_take_defaults() {
        let p = OffsetParams::new(0, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), 50);
        assert_eq!(p.offset(), 0);

        let p = OffsetParams::new(-2, -1);
        assert_eq!((p.page(), p.per_page()), (1, 50));
    }

    #[test]
    fn huge_pages_do_not_overflow() {
        let p = OffsetParams::new(i64::MAX, 50);
        assert_eq!(p.offset(), i64::MAX as u64);

        let p = OffsetParams::new(2, i64::MAX);
        assert_eq!(p.offset(), i64::MAX as u64);
        assert_eq!(OffsetPagination::new(&p, 3).total_pages, 1);
    }

    #[tokio::test]
    async fn last_page_holds_remainder() {
        let records = (0..8_u32).rev().collect::<Vec<_>>();
        let params = OffsetParams::new(3, 3);

        let (items, pagination) = paginate(
            &params,
            || async { Ok(records.len() as u64) },
            |skip, limit| {
                let page = records
                    .iter()
                    .skip(skip as usize)
                    .take(limit as usize)
                    .copied()
                    .collect::<Vec<_>>();
                async move { Ok(page) }
            },
        )
        .await
        .unwrap();

        assert_eq!(items, vec![1, 0]);
        assert_eq!(
            pagination,
            OffsetPagination {
                total_records: 8,
                total_pages: 3,
                per_page: 3,
                current_page: 3,
            }
        );
    }
}
