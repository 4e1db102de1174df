//! [`Handler`] abstraction.

use std::future::Future;

/// Something executing an `Op`eration asynchronously.
///
/// Commands, queries, database operations and background tasks are all
/// [`Handler`]s of their own `Op`eration types, so a single value (like a
/// service or a database client) may handle many of them.
pub trait Handler<Op = ()> {
    /// Outcome of a successfully executed `Op`eration.
    type Ok;

    /// Error of a failed `Op`eration.
    type Err;

    /// Executes the provided `Op`eration.
    fn execute(
        &self,
        op: Op,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

#[cfg(test)]
mod spec {
    use std::convert::Infallible;

    use super::Handler;

    struct Doubler;

    struct Double(u32);

    struct Halve(u32);

    impl Handler<Double> for Doubler {
        type Ok = u32;
        type Err = Infallible;

        async fn execute(&self, Double(n): Double) -> Result<u32, Infallible> {
            Ok(n * 2)
        }
    }

    impl Handler<Halve> for Doubler {
        type Ok = u32;
        type Err = &'static str;

        async fn execute(&self, Halve(n): Halve) -> Result<u32, Self::Err> {
            if n % 2 == 0 {
                Ok(n / 2)
            } else {
                Err("odd")
            }
        }
    }

    #[tokio::test]
    async fn dispatches_by_operation_type() {
        assert_eq!(Doubler.execute(Double(21)).await, Ok(42));
        assert_eq!(Doubler.execute(Halve(42)).await, Ok(21));
        assert_eq!(Doubler.execute(Halve(3)).await, Err("odd"));
    }
}
