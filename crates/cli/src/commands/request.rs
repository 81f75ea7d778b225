//! kuwetex-client command

use clap::{Args, ValueEnum};
use gateway::Connection;
use shared::MessageKind;
use tracing::debug;

/// What to ask the server for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Request {
    /// Usage history of every cat
    Report,
    /// Clean the litter box now
    Clean,
    /// Recommendations for the cats that were ill
    Recommendations,
}

impl Request {
    pub fn kind(self) -> MessageKind {
        match self {
            Request::Report => MessageKind::GetRaport,
            Request::Clean => MessageKind::ForceCleaning,
            Request::Recommendations => MessageKind::GetRecommendations,
        }
    }
}

#[derive(Debug, Args)]
pub struct RequestCommand {
    #[arg(value_enum)]
    pub request: Request,

    /// Text sent along with the request
    #[arg(long, default_value = "")]
    pub text: String,
}

impl RequestCommand {
    /// Log in, send the request, log out. Returns the server's answer.
    pub async fn run(&self, address: &str) -> anyhow::Result<String> {
        let (mut connection, greeting) = Connection::connect(address, &self.text).await?;
        debug!(%greeting, "Logged in");

        let answer = connection.send(self.request.kind(), &self.text).await?;
        let farewell = connection.close().await?;
        debug!(%farewell, "Logged out");
        Ok(answer)
    }
}
