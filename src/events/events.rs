use std::collections::HashSet;
use std::str::FromStr;

use crate::{
    config::Config,
    db::{
        Connection,
        models as db,
    },
    models::{
        edition::{Edition, FindEditionError},
        user::{FindUserError, User},
    },
};
use super::Error;

/// Something that happened to an edition that one of its authors should hear
/// about.
#[derive(Clone, Debug)]
pub enum Event {
    Published(Published),
    Rejected(Rejected),
    Unpublished(Unpublished),
}

/// An edition went live, by hand or from the publication queue.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Published {
    /// User who published, or `None` for scheduled publication.
    pub who: Option<i32>,
    /// Edition which was published.
    pub edition: i32,
}

/// A reviewer sent an edition back to its authors.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Rejected {
    /// User who rejected.
    pub who: i32,
    /// Edition which was rejected.
    pub edition: i32,
}

/// A published edition was withdrawn from the public site.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Unpublished {
    /// User who withdrew it.
    pub who: i32,
    /// Edition which was withdrawn.
    pub edition: i32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Published,
    Rejected,
    Unpublished,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Kind::Published => "published",
            Kind::Rejected => "rejected",
            Kind::Unpublished => "unpublished",
        }
    }
}

impl FromStr for Kind {
    type Err = ();

    fn from_str(s: &str) -> Result<Kind, ()> {
        match s {
            "published" => Ok(Kind::Published),
            "rejected" => Ok(Kind::Rejected),
            "unpublished" => Ok(Kind::Unpublished),
            _ => Err(()),
        }
    }
}

impl Event {
    pub fn kind(&self) -> Kind {
        match *self {
            Event::Published(_) => Kind::Published,
            Event::Rejected(_) => Kind::Rejected,
            Event::Unpublished(_) => Kind::Unpublished,
        }
    }

    /// Serialize this event's payload for storage.
    pub(super) fn serialize_data(&self) -> Result<Vec<u8>, rmps::encode::Error> {
        use serde::Serialize;

        let mut data = Vec::new();

        match *self {
            Event::Published(ref ev) =>
                ev.serialize(&mut rmps::Serializer::new(&mut data))?,
            Event::Rejected(ref ev) =>
                ev.serialize(&mut rmps::Serializer::new(&mut data))?,
            Event::Unpublished(ref ev) =>
                ev.serialize(&mut rmps::Serializer::new(&mut data))?,
        }

        Ok(data)
    }
}

impl_from! { for Event ;
    Published => |e| Event::Published(e),
    Rejected => |e| Event::Rejected(e),
    Unpublished => |e| Event::Unpublished(e),
}

/// A version of [`Event`] expanded to include additional information.
///
/// This enum is intended to be used where obtaining additional information
/// about an event would be difficult, for example inside an email template.
#[derive(Debug, Serialize)]
#[serde(tag = "kind")]
pub enum ExpandedEvent {
    #[serde(rename = "published")]
    Published {
        who: Option<ExpandedUser>,
        edition: ExpandedEdition,
    },
    #[serde(rename = "rejected")]
    Rejected {
        who: ExpandedUser,
        edition: ExpandedEdition,
    },
    #[serde(rename = "unpublished")]
    Unpublished {
        who: ExpandedUser,
        edition: ExpandedEdition,
    },
}

#[derive(Debug, Serialize)]
pub struct ExpandedUser {
    /// User's name.
    pub name: String,
    /// User's profile URL.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExpandedEdition {
    /// Edition's title.
    pub title: String,
    /// Edition's URL in the admin interface.
    pub url: String,
}

pub fn expand_event(config: &Config, dbcon: &Connection, event: &db::Event)
-> Result<ExpandedEvent, Error> {
    let kind = event.kind.parse::<Kind>()
        .map_err(|_| Error::UnknownEvent(event.kind.clone()))?;

    Ok(match kind {
        Kind::Published => {
            let ev: Published = rmps::from_slice(&event.data)?;

            ExpandedEvent::Published {
                who: match ev.who {
                    Some(who) => Some(expand_user(config, dbcon, who)?),
                    None => None,
                },
                edition: expand_edition(config, dbcon, ev.edition)?,
            }
        }
        Kind::Rejected => {
            let ev: Rejected = rmps::from_slice(&event.data)?;

            ExpandedEvent::Rejected {
                who: expand_user(config, dbcon, ev.who)?,
                edition: expand_edition(config, dbcon, ev.edition)?,
            }
        }
        Kind::Unpublished => {
            let ev: Unpublished = rmps::from_slice(&event.data)?;

            ExpandedEvent::Unpublished {
                who: expand_user(config, dbcon, ev.who)?,
                edition: expand_edition(config, dbcon, ev.edition)?,
            }
        }
    })
}

fn expand_user(config: &Config, dbcon: &Connection, id: i32)
-> Result<ExpandedUser, Error> {
    let user = match User::by_id(dbcon, id) {
        Ok(user) => user.into_db(),
        Err(FindUserError::Internal(err)) => return Err(err.into()),
        Err(FindUserError::NotFound) => panic!(
            "Inconsistent database: user doesn't exist \
            but is referenced by an event",
        ),
    };

    Ok(ExpandedUser {
        name: user.name,
        url: format!("https://{}/admin/users/{}",
            config.server.domain, user.id),
    })
}

fn expand_edition(config: &Config, dbcon: &Connection, id: i32)
-> Result<ExpandedEdition, Error> {
    let edition = match Edition::by_id(dbcon, id) {
        Ok(edition) => edition.into_db(),
        Err(FindEditionError::Database(err)) => return Err(err.into()),
        Err(FindEditionError::NotFound) => panic!(
            "Inconsistent database: edition doesn't exist \
            but is referenced by an event",
        ),
    };

    Ok(ExpandedEdition {
        title: edition.title,
        url: format!("https://{}/admin/editions/{}",
            config.server.domain, edition.id),
    })
}

/// Narrow a list of authors down to the users who should actually receive
/// a notification.
///
/// Authors are de-duplicated by ID; those without an email address, and
/// those listed in `exclude`, are dropped.
pub fn notification_recipients(authors: Vec<db::User>, exclude: &[i32])
-> Vec<db::User> {
    let mut seen = HashSet::new();

    authors.into_iter()
        .filter(|user| user.email.is_some()
            && !exclude.contains(&user.id)
            && seen.insert(user.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::db::models as db;
    use super::notification_recipients;

    fn author(id: i32, email: Option<&str>) -> db::User {
        db::User {
            id,
            email: email.map(String::from),
            name: format!("Author {}", id),
            password: Vec::new(),
            salt: Vec::new(),
            permissions: 0,
        }
    }

    #[test]
    fn authors_without_email_and_the_actor_are_skipped() {
        let authors = vec![
            author(1, Some("a@example.gov")),
            author(2, None),
            author(3, Some("c@example.gov")),
        ];

        let recipients = notification_recipients(authors, &[1]);

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].id, 3);
    }

    #[test]
    fn each_author_is_notified_once() {
        let authors = vec![
            author(1, Some("a@example.gov")),
            author(1, Some("a@example.gov")),
        ];

        let recipients = notification_recipients(authors, &[]);

        assert_eq!(recipients.len(), 1);
    }

    #[test]
    fn excluding_no_one_keeps_all_addressable_authors() {
        let authors = vec![
            author(1, Some("a@example.gov")),
            author(2, Some("b@example.gov")),
        ];

        let recipients = notification_recipients(authors, &[]);

        assert_eq!(recipients.len(), 2);
    }
}
