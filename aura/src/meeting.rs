//! Meeting invitations delivered by e-mail.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::client::Aura;
use crate::error::{Error, Result};

/// Name of the meeting e-mail function.
pub const MEETING_FUNCTION: &str = "send-meeting-email";

/// A validated meeting invitation.
///
/// Build it with [`MeetingInvite::builder`]; the fields are serialized in the
/// shape the e-mail function expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingInvite {
    title: String,
    date: String,
    time: String,
    duration: String,
    description: String,
    attendees: Vec<String>,
}

impl MeetingInvite {
    /// Starts building an invitation.
    #[must_use]
    pub fn builder(title: impl Into<String>) -> MeetingInviteBuilder {
        MeetingInviteBuilder {
            title: title.into(),
            ..MeetingInviteBuilder::default()
        }
    }

    /// Meeting title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Recipients.
    #[must_use]
    pub fn attendees(&self) -> &[String] {
        &self.attendees
    }
}

/// Builder for [`MeetingInvite`].
#[derive(Debug, Clone, Default)]
pub struct MeetingInviteBuilder {
    title: String,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    duration_minutes: u32,
    description: String,
    attendees: Vec<String>,
}

impl MeetingInviteBuilder {
    /// Sets the date.
    #[must_use]
    pub const fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the start time.
    #[must_use]
    pub const fn time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the duration in minutes.
    #[must_use]
    pub const fn duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds one attendee address.
    #[must_use]
    pub fn attendee(mut self, email: impl Into<String>) -> Self {
        self.attendees.push(email.into());
        self
    }

    /// Adds every address of a comma-separated list.
    #[must_use]
    pub fn attendees_csv(mut self, list: &str) -> Self {
        self.attendees.extend(parse_attendees(list));
        self
    }

    /// Validates and builds the invitation.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] when the title is blank, the date, time or a
    /// positive duration is missing, there are no attendees, or an attendee
    /// does not look like an e-mail address.
    pub fn build(self) -> Result<MeetingInvite> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::invalid_request("meeting title is required"));
        }
        let date = self
            .date
            .ok_or_else(|| Error::invalid_request("meeting date is required"))?;
        let time = self
            .time
            .ok_or_else(|| Error::invalid_request("meeting time is required"))?;
        if self.duration_minutes == 0 {
            return Err(Error::invalid_request("meeting duration must be positive"));
        }

        let attendees: Vec<String> = self
            .attendees
            .iter()
            .map(|email| email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_owned)
            .collect();
        if attendees.is_empty() {
            return Err(Error::invalid_request("at least one attendee is required"));
        }
        if let Some(bad) = attendees.iter().find(|email| !looks_like_email(email)) {
            return Err(Error::invalid_request(format!("invalid attendee address: {bad}")));
        }

        Ok(MeetingInvite {
            title: title.to_owned(),
            date: date.format("%Y-%m-%d").to_string(),
            time: time.format("%H:%M").to_string(),
            duration: self.duration_minutes.to_string(),
            description: self.description.trim().to_owned(),
            attendees,
        })
    }
}

/// Splits a comma-separated attendee list, trimming and dropping empties.
#[must_use]
pub fn parse_attendees(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_owned)
        .collect()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Delivery report from the e-mail function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeetingDelivery {
    /// Whether the function ran to completion.
    pub success: bool,
    /// Invitations accepted by the mail provider.
    pub sent: u32,
    /// Invitations that failed.
    pub failed: u32,
    /// Human-readable summary.
    pub message: String,
}

impl MeetingDelivery {
    /// Returns `true` if every attendee was reached.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.success && self.failed == 0
    }
}

impl Aura {
    /// Sends the invitation to every attendee.
    ///
    /// Delivery is best effort per attendee; partial failure is reported in
    /// the returned [`MeetingDelivery`], not as an error.
    ///
    /// # Errors
    ///
    /// Any transport error.
    pub async fn send_meeting_invite(&self, invite: &MeetingInvite) -> Result<MeetingDelivery> {
        tracing::debug!(
            title = invite.title(),
            attendees = invite.attendees().len(),
            "sending meeting invite"
        );
        let delivery: MeetingDelivery = self.invoke(MEETING_FUNCTION, invite).await?;
        if delivery.failed > 0 {
            tracing::warn!(
                sent = delivery.sent,
                failed = delivery.failed,
                "some meeting invitations were not delivered"
            );
        }
        Ok(delivery)
    }
}
