//! `Either`/`EitherAnd` sum types (spec §6) used by `merge` and
//! `combineProgress`. Grounded on the teacher's habit of keeping small,
//! focused result-shaped primitives in their own module (cf. `node_result.rs`).

/// One of two possible values, as produced by `merge(L, R)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<L, R> {
    /// Came from the left-hand parent.
    Left(L),
    /// Came from the right-hand parent.
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Run `f` if this is `Left`.
    pub fn on_left(self, f: impl FnOnce(L)) -> Self
    where
        L: Clone,
        R: Clone,
    {
        if let Either::Left(ref l) = self {
            f(l.clone());
        }
        self
    }

    /// Run `f` if this is `Right`.
    pub fn on_right(self, f: impl FnOnce(R)) -> Self
    where
        L: Clone,
        R: Clone,
    {
        if let Either::Right(ref r) = self {
            f(r.clone());
        }
        self
    }

    /// `true` if this is `Left`.
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// `true` if this is `Right`.
    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }
}

/// Either side, both sides, or neither — the shape `combineProgress` folds
/// two progressions through (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EitherAnd<L, R> {
    /// Only the left side has produced a value so far.
    Left(L),
    /// Only the right side has produced a value so far.
    Right(R),
    /// Both sides have produced a value.
    Both(L, R),
}

impl<L, R> EitherAnd<L, R> {
    /// Run `f` if both sides are present.
    pub fn on_both(self, f: impl FnOnce(&L, &R)) -> Self {
        if let EitherAnd::Both(ref l, ref r) = self {
            f(l, r);
        }
        self
    }
}

/// A success/failure result with Rx-style observer methods, built over
/// `std::result::Result` rather than replacing it (spec §6: "Result/Either
/// sum types... are primitives").
pub trait ResultExt<T, E> {
    /// Run `f` on the success value, passing the result through unchanged.
    fn on_success(self, f: impl FnOnce(&T)) -> Self;
    /// Run `f` on the failure value, passing the result through unchanged.
    fn on_failure(self, f: impl FnOnce(&E)) -> Self;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn on_success(self, f: impl FnOnce(&T)) -> Self {
        if let Ok(ref v) = self {
            f(v);
        }
        self
    }

    fn on_failure(self, f: impl FnOnce(&E)) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_observers_only_fire_for_their_side() {
        let mut seen = None;
        let _: Either<i32, &str> = Either::Left(7).on_left(|v| seen = Some(v)).on_right(|_| panic!());
        assert_eq!(seen, Some(7));
    }

    #[test]
    fn either_and_both_fires_only_when_complete() {
        let mut fired = false;
        let _: EitherAnd<i32, i32> = EitherAnd::Left(1).on_both(|_, _| fired = true);
        assert!(!fired);
        let _: EitherAnd<i32, i32> = EitherAnd::Both(1, 2).on_both(|_, _| fired = true);
        assert!(fired);
    }

    #[test]
    fn result_ext_observers_pass_through() {
        let r: Result<i32, &str> = Ok(5);
        let mut seen = 0;
        let r2 = r.on_success(|v| seen = *v).on_failure(|_| panic!());
        assert_eq!(r2, Ok(5));
        assert_eq!(seen, 5);
    }
}
