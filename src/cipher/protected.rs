use std::fmt::{Debug, Formatter, Result};

use zeroize::Zeroize;

/// Holds key bytes and wipes them when dropped.
///
/// Deliberately not `Clone`: every copy of a derived key would be one more
/// buffer to wipe.
pub struct Protected<T>
where
    T: Zeroize,
{
    data: T,
}

impl<T> Protected<T>
where
    T: Zeroize,
{
    pub const fn new(value: T) -> Self {
        Self { data: value }
    }

    pub const fn expose(&self) -> &T {
        &self.data
    }

    pub const fn expose_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for Protected<T>
where
    T: Zeroize,
{
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl<T> Debug for Protected<T>
where
    T: Zeroize,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_contents() {
        let key = Protected::new(vec![0xAB_u8; 16]);
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(key.expose().len(), 16);
    }
}
