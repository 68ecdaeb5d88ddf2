//! GrapheneOS release channel lookup
//!
//! Channels are plain-text documents at
//! `https://releases.grapheneos.org/{device}-{branch}` whose first
//! whitespace-separated token is the latest OS version.

use crate::error::{KrelError, KrelResult};
use crate::http;
use crate::resolve::ReleaseChannel;
use tracing::debug;
use ureq::Agent;

const RELEASES_BASE: &str = "https://releases.grapheneos.org";

/// Release channel client for releases.grapheneos.org
pub struct GrapheneosReleases {
    agent: Agent,
}

impl GrapheneosReleases {
    pub fn new() -> Self {
        Self {
            agent: http::agent(),
        }
    }
}

impl Default for GrapheneosReleases {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the version token from a channel document
fn parse_channel(channel: &str, body: &str) -> KrelResult<String> {
    body.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| KrelError::ChannelEmpty {
            channel: channel.to_string(),
        })
}

impl ReleaseChannel for GrapheneosReleases {
    fn latest_release(&self, device: &str, branch: &str) -> KrelResult<String> {
        let channel = format!("{device}-{branch}");
        let url = format!("{RELEASES_BASE}/{channel}");
        debug!("Fetching release channel {}", channel);

        let mut response = self.agent.get(&url).call()?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(KrelError::ResolutionFailed {
                repo: RELEASES_BASE.to_string(),
                ref_name: channel,
                status,
                body: http::body_text(&mut response),
            });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(KrelError::Transport)?;
        parse_channel(&channel, &body)
    }
}
