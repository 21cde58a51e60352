use std::fmt::Display;

use anyhow::anyhow;

use crate::AnyResult;

/// cosmrs errors are `eyre` reports, convert them at the call site.
pub trait IntoAnyhowResult {
    type Output;
    fn into_anyresult(self) -> AnyResult<Self::Output>;
}

impl<T, E> IntoAnyhowResult for Result<T, E>
where
    E: Display,
{
    type Output = T;

    fn into_anyresult(self) -> AnyResult<T> {
        self.map_err(|err| anyhow!("{}", err))
    }
}

pub trait OkOrAny {
    type Output;
    fn ok_or_any(self, error: &str) -> AnyResult<Self::Output>;
}

impl<T> OkOrAny for Option<T> {
    type Output = T;
    fn ok_or_any(self, error: &str) -> AnyResult<T> {
        self.ok_or(anyhow!("{}", error))
    }
}
