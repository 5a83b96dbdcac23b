use chrono::NaiveDateTime;
use diesel::{prelude::*, result::Error as DbError};
use failure::Fail;
use url::Url;

use crate::{
    ApiError,
    db::{
        Connection,
        models as db,
        schema::unpublishings,
        types::UnpublishingReason,
    },
};

/// The record of a published edition's withdrawal from the public site.
///
/// Exactly one is created by each unpublish transition, in the same
/// transaction. An edition which is published again and withdrawn a second
/// time gets a fresh record; only the latest is kept.
#[derive(Clone, Debug)]
pub struct Unpublishing {
    data: db::Unpublishing,
}

/// A subset of an unpublishing's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub edition: i32,
    pub reason: UnpublishingReason,
    pub explanation: Option<String>,
    pub alternative_url: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Details of a withdrawal, supplied by the withdrawing user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Params {
    pub reason: UnpublishingReason,
    pub explanation: Option<String>,
    pub alternative_url: Option<String>,
}

impl Params {
    /// Check that these parameters describe a usable withdrawal.
    pub fn validate(&self) -> Result<(), ValidateParamsError> {
        if let Some(ref url) = self.alternative_url {
            Url::parse(url)
                .map_err(|_| ValidateParamsError::InvalidAlternativeUrl)?;
        }

        Ok(())
    }
}

impl Unpublishing {
    /// Construct `Unpublishing` from its database counterpart.
    pub(super) fn from_db(data: db::Unpublishing) -> Unpublishing {
        Unpublishing { data }
    }

    /// Record a withdrawal of `edition`.
    ///
    /// Must be called from the transaction performing the state change.
    pub(super) fn create(
        dbcon: &Connection,
        edition: &db::Edition,
        params: &Params,
    ) -> Result<Unpublishing, DbError> {
        diesel::insert_into(unpublishings::table)
            .values(&db::NewUnpublishing {
                edition: edition.id,
                reason: params.reason,
                explanation: params.explanation.as_ref().map(String::as_str),
                alternative_url: params.alternative_url.as_ref()
                    .map(String::as_str),
            })
            .on_conflict(unpublishings::edition)
            .do_update()
            .set((
                unpublishings::reason.eq(params.reason),
                unpublishings::explanation.eq(params.explanation.as_ref()
                    .map(String::as_str)),
                unpublishings::alternative_url.eq(params.alternative_url
                    .as_ref().map(String::as_str)),
                unpublishings::created_at.eq(diesel::dsl::now),
            ))
            .get_result::<db::Unpublishing>(dbcon)
            .map(Unpublishing::from_db)
    }

    /// Find the withdrawal record for an edition.
    pub fn by_edition(dbcon: &Connection, edition: i32)
    -> Result<Unpublishing, FindUnpublishingError> {
        unpublishings::table
            .filter(unpublishings::edition.eq(edition))
            .get_result::<db::Unpublishing>(dbcon)
            .optional()?
            .ok_or(FindUnpublishingError::NotFound)
            .map(Unpublishing::from_db)
    }

    /// Get the public portion of this unpublishing's data.
    pub fn get_public(&self) -> PublicData {
        let db::Unpublishing {
            edition,
            reason,
            ref explanation,
            ref alternative_url,
            created_at,
            ..
        } = self.data;

        PublicData {
            edition,
            reason,
            explanation: explanation.clone(),
            alternative_url: alternative_url.clone(),
            created_at,
        }
    }
}

impl std::ops::Deref for Unpublishing {
    type Target = db::Unpublishing;

    fn deref(&self) -> &db::Unpublishing {
        &self.data
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum FindUnpublishingError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// No unpublishing found matching given criteria.
    #[api(code = "unpublishing:not-found", status = "NOT_FOUND")]
    #[fail(display = "No such unpublishing")]
    NotFound,
}

impl_from! { for FindUnpublishingError ;
    DbError => |e| FindUnpublishingError::Database(e),
}

#[derive(ApiError, Debug, Fail)]
pub enum ValidateParamsError {
    /// The alternative URL does not parse as a URL.
    #[api(code = "unpublishing:invalid-alternative-url",
        status = "BAD_REQUEST")]
    #[fail(display = "The alternative URL is not a valid URL")]
    InvalidAlternativeUrl,
}

#[cfg(test)]
mod tests {
    use crate::db::types::UnpublishingReason;
    use super::Params;

    #[test]
    fn params_without_alternative_url_are_valid() {
        let params = Params {
            reason: UnpublishingReason::Withdrawn,
            explanation: Some("Was classified".into()),
            alternative_url: None,
        };

        assert!(params.validate().is_ok());
    }

    #[test]
    fn alternative_url_must_parse() {
        let mut params = Params {
            reason: UnpublishingReason::Consolidated,
            explanation: None,
            alternative_url: Some("http://website.com/alt".into()),
        };

        assert!(params.validate().is_ok());

        params.alternative_url = Some("not a url".into());
        assert!(params.validate().is_err());
    }
}
