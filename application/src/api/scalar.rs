//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Resolver of a GraphQL string scalar wrapping the `Domain` type, for the
/// `#[graphql(with = ..)]` attribute.
///
/// The scalar is written and read via the [`Display`] and [`FromStr`] impls of
/// the `Domain` type, so any domain validation applies to inputs.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<Domain>(PhantomData<Domain>);

impl<Domain> Via<Domain> {
    /// Outputs the `Domain` value wrapped into the `scalar` as a string.
    pub fn to_output<T, S>(scalar: &T) -> Value<S>
    where
        Domain: fmt::Display,
        T: AsRef<Domain>,
        S: ScalarValue,
    {
        Value::scalar(scalar.as_ref().to_string())
    }

    /// Parses the `Domain` value out of the string `input` and wraps it into
    /// the scalar.
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, or is not a valid `Domain` value.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        Domain: FromStr,
        Domain::Err: fmt::Display,
        T: From<Domain> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("Scalar");
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` expects a string, found: {input}")
        })?;
        s.parse::<Domain>()
            .map(T::from)
            .map_err(|e| format!("Invalid `{name}` \"{s}\": {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue, Value};
    use service::domain;

    use crate::api::vehicle::Plate;

    use super::Via;

    type PlateVia = Via<domain::vehicle::Plate>;

    #[test]
    fn reads_valid_input() {
        let plate = PlateVia::from_input::<Plate, DefaultScalarValue>(
            &InputValue::scalar("ABC-123".to_owned()),
        )
        .unwrap();

        assert_eq!(
            PlateVia::to_output::<_, DefaultScalarValue>(&plate),
            Value::scalar("ABC-123".to_owned()),
        );
    }

    #[test]
    fn rejects_invalid_input() {
        let err = PlateVia::from_input::<Plate, DefaultScalarValue>(
            &InputValue::scalar("ABC 123".to_owned()),
        )
        .unwrap_err();
        assert!(
            err.starts_with("Invalid `VehiclePlate` \"ABC 123\""),
            "{err}",
        );

        let err = PlateVia::from_input::<Plate, DefaultScalarValue>(
            &InputValue::scalar(42),
        )
        .unwrap_err();
        assert!(err.starts_with("`VehiclePlate` expects a string"), "{err}");
    }
}
