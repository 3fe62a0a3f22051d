use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use agenda_sdk::NotificationKind;

#[derive(Parser)]
#[command(
    name = "agenda",
    about = "Agenda: appointments and invitations authorized by identity",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Journal file; without one the agenda lives only for this command.
    #[arg(long, global = true, env = "AGENDA_JOURNAL")]
    pub journal: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this identity (64-hex, `id:`-prefixed hex, or a handle).
    #[arg(long = "as", global = true, env = "AGENDA_AS")]
    pub caller: Option<String>,

    /// Pretend the current time is this timestamp.
    #[arg(long, global = true)]
    pub at: Option<u64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the identity behind --as
    Whoami,
    /// Create an appointment owned by the caller
    Schedule(ScheduleArgs),
    /// Remove an appointment and its invitations
    Unschedule(AppointmentArgs),
    /// Change an appointment's time window
    Move(MoveArgs),
    /// Invite identities to an appointment
    Invite(InviteArgs),
    /// Withdraw an invitation
    Uninvite(UninviteArgs),
    /// Accept an invitation addressed to the caller
    Approve(AnswerArgs),
    /// Decline an invitation addressed to the caller
    Deny(AnswerArgs),
    /// Show one appointment with its invitations
    Show(AppointmentArgs),
    /// List an owner's appointments
    List(ListArgs),
    /// List the invitations of an appointment
    Invitations(AppointmentArgs),
    /// Show the notification log
    Events(EventsArgs),
    /// Check journal and state consistency
    Verify,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub from: u64,
    #[arg(long)]
    pub to: u64,
    /// Identities invited right away.
    #[arg(long = "invite", value_delimiter = ',')]
    pub invitees: Vec<String>,
    #[arg(long)]
    pub recurring: bool,
}

#[derive(Args)]
pub struct AppointmentArgs {
    pub id: String,
}

#[derive(Args)]
pub struct MoveArgs {
    pub id: String,
    #[arg(long)]
    pub from: u64,
    #[arg(long)]
    pub to: u64,
}

#[derive(Args)]
pub struct InviteArgs {
    pub id: String,
    #[arg(required = true)]
    pub identities: Vec<String>,
}

#[derive(Args)]
pub struct UninviteArgs {
    pub id: String,
    pub invitation: String,
    /// Identities the invitation may belong to.
    #[arg(required = true)]
    pub identities: Vec<String>,
}

#[derive(Args)]
pub struct AnswerArgs {
    pub id: String,
    pub invitation: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Whose appointments; defaults to the caller.
    pub owner: Option<String>,
    /// Only appointments whose window is still open.
    #[arg(long)]
    pub upcoming: bool,
}

#[derive(Args)]
pub struct EventsArgs {
    /// Only events after this sequence number.
    #[arg(long, default_value = "0")]
    pub after: u64,
    #[arg(long, value_enum)]
    pub kind: Vec<KindArg>,
    #[arg(long)]
    pub appointment: Option<String>,
    /// Only events naming this identity.
    #[arg(long)]
    pub identity: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Created,
    Unscheduled,
    Moved,
    Invited,
    Uninvited,
    Approved,
    Denied,
}

impl From<KindArg> for NotificationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Created => Self::AppointmentCreated,
            KindArg::Unscheduled => Self::AppointmentUnscheduled,
            KindArg::Moved => Self::AppointmentMoved,
            KindArg::Invited => Self::MemberInvited,
            KindArg::Uninvited => Self::MemberUninvited,
            KindArg::Approved => Self::InvitationApproved,
            KindArg::Denied => Self::InvitationDenied,
        }
    }
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides the configured bind address.
    #[arg(long)]
    pub bind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whoami() {
        let cli = Cli::try_parse_from(["agenda", "--as", "alice", "whoami"]).unwrap();
        assert!(matches!(cli.command, Command::Whoami));
        assert_eq!(cli.caller, Some("alice".into()));
    }

    #[test]
    fn parse_schedule_with_invitees() {
        let cli = Cli::try_parse_from([
            "agenda", "schedule", "--from", "10", "--to", "20", "--invite", "bob,carol",
            "--recurring",
        ])
        .unwrap();
        if let Command::Schedule(args) = cli.command {
            assert_eq!((args.from, args.to), (10, 20));
            assert_eq!(args.invitees, vec!["bob", "carol"]);
            assert!(args.recurring);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn schedule_requires_window() {
        assert!(Cli::try_parse_from(["agenda", "schedule", "--from", "10"]).is_err());
    }

    #[test]
    fn parse_move() {
        let cli =
            Cli::try_parse_from(["agenda", "move", "#3", "--from", "5", "--to", "9"]).unwrap();
        if let Command::Move(args) = cli.command {
            assert_eq!(args.id, "#3");
            assert_eq!(args.to, 9);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn invite_needs_identities() {
        assert!(Cli::try_parse_from(["agenda", "invite", "1"]).is_err());
        let cli = Cli::try_parse_from(["agenda", "invite", "1", "bob", "carol"]).unwrap();
        if let Command::Invite(args) = cli.command {
            assert_eq!(args.identities.len(), 2);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_uninvite() {
        let cli = Cli::try_parse_from(["agenda", "uninvite", "1", "2", "bob"]).unwrap();
        if let Command::Uninvite(args) = cli.command {
            assert_eq!(args.invitation, "2");
            assert_eq!(args.identities, vec!["bob"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_approve_and_deny() {
        let cli = Cli::try_parse_from(["agenda", "approve", "1", "1"]).unwrap();
        assert!(matches!(cli.command, Command::Approve(_)));
        let cli = Cli::try_parse_from(["agenda", "deny", "1", "1"]).unwrap();
        assert!(matches!(cli.command, Command::Deny(_)));
    }

    #[test]
    fn parse_list_upcoming() {
        let cli = Cli::try_parse_from(["agenda", "list", "--upcoming"]).unwrap();
        if let Command::List(args) = cli.command {
            assert!(args.upcoming);
            assert!(args.owner.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_events_filters() {
        let cli = Cli::try_parse_from([
            "agenda", "events", "--after", "4", "--kind", "invited", "--kind", "approved",
        ])
        .unwrap();
        if let Command::Events(args) = cli.command {
            assert_eq!(args.after, 4);
            assert_eq!(args.kind, vec![KindArg::Invited, KindArg::Approved]);
            assert_eq!(
                NotificationKind::from(args.kind[0]),
                NotificationKind::MemberInvited
            );
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "agenda", "verify", "--journal", "a.wal", "--at", "100", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Verify));
        assert_eq!(cli.journal, Some(PathBuf::from("a.wal")));
        assert_eq!(cli.at, Some(100));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["agenda", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".into()));
        } else {
            panic!("wrong command");
        }
    }
}
