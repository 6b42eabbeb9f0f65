/// Two values whose roles alternate.
///
/// Roles are positional: slot 0 is "read", slot 1 is "write". `swap` reverses
/// the pair, so there is no separate flag to drift out of sync.
#[derive(Debug, Clone, PartialEq)]
pub struct PingPong<T> {
    pair: [T; 2],
}

impl<T> PingPong<T> {
    pub fn new(read: T, write: T) -> Self {
        Self {
            pair: [read, write],
        }
    }

    #[inline]
    pub fn read(&self) -> &T {
        &self.pair[0]
    }

    #[inline]
    pub fn write(&self) -> &T {
        &self.pair[1]
    }

    pub fn write_mut(&mut self) -> &mut T {
        &mut self.pair[1]
    }

    /// Reverses the pair: what was written becomes the next read.
    #[inline]
    pub fn swap(&mut self) {
        self.pair.reverse();
    }

    pub fn into_inner(self) -> [T; 2] {
        self.pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_roles() {
        let mut p = PingPong::new("a", "b");
        p.swap();
        assert_eq!(*p.read(), "b");
        assert_eq!(*p.write(), "a");
    }

    #[test]
    fn swap_is_an_involution() {
        let mut p = PingPong::new(1, 2);
        let before = p.clone();
        p.swap();
        p.swap();
        assert_eq!(p, before);
    }

    #[test]
    fn mutation_follows_the_role() {
        let mut p = PingPong::new(0, 0);
        *p.write_mut() = 7;
        p.swap();
        assert_eq!(*p.read(), 7);
    }
}
