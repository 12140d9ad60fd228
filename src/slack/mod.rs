//! Human-facing connection notices.
//!
//! Pure sinks: given the final connection details, print a console
//! summary into the job log and build the chat message blocks for the
//! optional webhook.

pub mod webhook;

use serde_json::{json, Value};

/// Base URL of the client portal linked from notices.
pub const CLIENT_BASE: &str = "https://client.border0.com";

/// Final connection details for one provisioned socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionNotice {
    /// Job status reported by the CI platform.
    pub job_status: String,
    /// Workflow name.
    pub workflow: String,
    /// URL of the workflow run.
    pub run_url: String,
    /// User who triggered the run.
    pub actor: String,
    /// DNS name of the socket endpoint.
    pub dns_name: String,
    /// Organization extracted from the DNS name.
    pub org_name: String,
    /// Login user the SSH socket was provisioned for.
    pub ssh_username: String,
}

impl ConnectionNotice {
    /// Portal URL for logging into the socket.
    #[must_use]
    pub fn client_url(&self) -> String {
        format!(
            "{CLIENT_BASE}/#/ssh/{}?org={}",
            self.dns_name, self.org_name
        )
    }

    /// Equivalent command line for connecting from a terminal.
    #[must_use]
    pub fn ssh_command(&self) -> String {
        format!("border0 client ssh {}@{}", self.ssh_username, self.dns_name)
    }
}

/// Chat message blocks for the webhook notice.
#[must_use]
pub fn message_blocks(notice: &ConnectionNotice) -> Vec<Value> {
    vec![
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "Tunnel socket for workflow run <{}|{}>",
                    notice.run_url, notice.workflow
                ),
            }
        }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "Hey, {}. Your workflow is running an SSH socket. \
                     You can click the link below to log in and troubleshoot:",
                    notice.actor
                ),
            }
        }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": notice.client_url(),
            }
        }),
    ]
}

/// Print the connection summary into the job log.
pub fn print_summary(notice: &ConnectionNotice) {
    println!(
        "\n\nWorkflow run {}: {} ({})\n\n\
         Hey, {}. Your workflow is running an SSH socket. \
         You can click the link below to log in and troubleshoot:\n{}\n\n\
         Alternatively, use the following command to ssh into the runner:\n\
         $> {}\n",
        notice.job_status,
        notice.workflow,
        notice.run_url,
        notice.actor,
        notice.client_url(),
        notice.ssh_command(),
    );
}
