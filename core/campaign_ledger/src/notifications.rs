//! Per-role notification logs.
//!
//! Logs are append-only and newest first. Entries only hold a weak link
//! (id and title) back to the campaign that triggered them, so they outlive
//! campaign deletion.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CampaignId;

/// Platform roles that act on campaigns and receive notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ngo,
    Volunteer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ngo => "ngo",
            Self::Volunteer => "volunteer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ngo => "NGO",
            Self::Volunteer => "Volunteer",
            Self::Admin => "Admin",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRef {
    pub campaign_id: CampaignId,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<CampaignRef>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NotificationLog {
    ngo: VecDeque<Notification>,
    volunteer: VecDeque<Notification>,
    admin: VecDeque<Notification>,
}

impl NotificationLog {
    pub fn push(&mut self, notification: Notification) {
        self.feed_mut(notification.role).push_front(notification);
    }

    pub fn for_role(&self, role: Role) -> &VecDeque<Notification> {
        match role {
            Role::Ngo => &self.ngo,
            Role::Volunteer => &self.volunteer,
            Role::Admin => &self.admin,
        }
    }

    pub fn len(&self) -> usize {
        self.ngo.len() + self.volunteer.len() + self.admin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn feed_mut(&mut self, role: Role) -> &mut VecDeque<Notification> {
        match role {
            Role::Ngo => &mut self.ngo,
            Role::Volunteer => &mut self.volunteer,
            Role::Admin => &mut self.admin,
        }
    }
}
