/// Pipes a value into a closure, `value.let_(Ok)` instead of `Ok(value)`.
pub(crate) trait LetChain: Sized {
    #[inline]
    fn let_<R>(self, f: impl FnOnce(Self) -> R) -> R { f(self) }
}
impl<T> LetChain for T {}

/// Peeks at a value in the middle of a chain, mostly for `trace!`.
pub(crate) trait AlsoChain: Sized {
    #[inline]
    fn also_(self, f: impl FnOnce(&Self)) -> Self {
        f(&self);
        self
    }
}
impl<T> AlsoChain for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_pass_values_through() {
        let mut seen = 0;

        let out = 20_u32.let_(|n| n + 1).also_(|n| seen = *n).let_(|n| n * 2);

        assert_eq!((seen, out), (21, 42));
    }
}
