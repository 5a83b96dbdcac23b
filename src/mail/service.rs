use actix::{Actor, Context, Handler, Supervised, SystemService};
use serde::Serialize;
use lettre_email::Mailbox;

use crate::{Result, templates::MAILS};
use super::transport::{self, Message, Transport};

pub struct Mailer {
    transport: Box<dyn Transport>,
}

impl Mailer {
    /// Try to send an email message.
    ///
    /// Errors will be logged, but otherwise ignored.
    pub fn send<M, S, C>(to: M, template: &str, subject: S, context: C)
    where
        M: Into<Mailbox>,
        S: Into<String> + Send,
        C: Serialize + Send,
    {
        let mailer = Mailer::from_registry();
        let message = match format_message(to, template, subject, context) {
            Ok(message) => message,
            Err(err) => {
                error!("Could not format message: {}", err);
                return;
            }
        };

        if let Err(err) = mailer.try_send(message) {
            error!("Could not send mail: {}", err);
        }
    }
}

fn format_message<M, S, C>(to: M, template: &str, subject: S, context: C)
-> Result<Message>
where
    M: Into<Mailbox>,
    S: Into<String>,
    C: Serialize,
{
    let template_html = format!("{}.html", template);
    let template_text = format!("{}.txt", template);

    Ok(Message {
        to: to.into(),
        subject: subject.into(),
        html: MAILS.render(&template_html, &context)
            .map_err(|e| failure::err_msg(e.to_string()))?,
        text: MAILS.render(&template_text, &context)
            .map_err(|e| failure::err_msg(e.to_string()))?,
    })
}

impl Default for Mailer {
    fn default() -> Self {
        let config = crate::config::load()
            .expect("Configuration should be ready when mailer is started");

        let transport = transport::from_config(&config.mail);

        Self { transport }
    }
}

impl Actor for Mailer {
    type Context = Context<Self>;
}

impl Supervised for Mailer {
}

impl SystemService for Mailer {
}

impl actix::Message for Message {
    type Result = ();
}

impl Handler<Message> for Mailer {
    type Result = ();

    fn handle(&mut self, msg: Message, _: &mut Self::Context) {
        match self.transport.send(msg) {
            Ok(()) => (),
            Err(err) => {
                error!("Could not send email: {}", err);
            }
        }
    }
}
