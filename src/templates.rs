use std::borrow::Cow;
use tera::Tera;

use crate::events::ExpandedEvent;

lazy_static! {
    pub static ref MAILS: Tera = create("templates/mail/**/*");
}

fn create(glob: &str) -> Tera {
    compile_templates!(glob)
}

/// Arguments for `mail/notify`.
#[derive(Serialize)]
pub struct NotifyMailArgs<'a> {
    /// The event to describe.
    pub event: &'a ExpandedEvent,
    /// Various URLs which can be used in the email.
    pub urls: NotifyMailArgsUrls<'a>,
}

#[derive(Serialize)]
pub struct NotifyMailArgsUrls<'a> {
    pub admin: Cow<'a, str>,
}
