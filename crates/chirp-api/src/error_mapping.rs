// SPDX-License-Identifier: MIT

use crate::errors::{ApiError, ApiErrorCode};

/// Maps an error code to its HTTP status.
///
/// `Conflict` maps to 400, not 409: the contract this server preserves
/// reports duplicate like/retweet/follow attempts as Bad Request, and
/// clients match on that.
#[must_use]
pub fn status_for(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::Unauthenticated => 401,
        ApiErrorCode::ValidationFailed | ApiErrorCode::DisallowedField | ApiErrorCode::Conflict => {
            400
        }
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::Internal => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> u16 {
    status_for(error.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_keeps_the_legacy_400_status() {
        assert_eq!(status_for(ApiErrorCode::Conflict), 400);
    }

    #[test]
    fn every_code_maps_to_a_4xx_or_5xx() {
        let codes = [
            ApiErrorCode::Unauthenticated,
            ApiErrorCode::ValidationFailed,
            ApiErrorCode::DisallowedField,
            ApiErrorCode::Conflict,
            ApiErrorCode::Forbidden,
            ApiErrorCode::NotFound,
            ApiErrorCode::PayloadTooLarge,
            ApiErrorCode::Internal,
        ];
        for code in codes {
            let status = status_for(code);
            assert!((400..600).contains(&status), "{code:?} -> {status}");
        }
    }
}
