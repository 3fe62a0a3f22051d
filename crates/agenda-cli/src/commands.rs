use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use agenda_sdk::{
    Agenda, Appointment, AppointmentId, Clock, EventFilter, FabricEvent, Identity, Invitation,
    InvitationId, InvitationStatus, ManualClock, NotificationKind, SystemClock, Timestamp,
};
use agenda_server::{AgendaServer, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let session = Session::open(&cli, &config)?;
    match cli.command {
        Command::Whoami => session.whoami(),
        Command::Schedule(args) => session.schedule(args),
        Command::Unschedule(args) => session.unschedule(args),
        Command::Move(args) => session.move_appointment(args),
        Command::Invite(args) => session.invite(args),
        Command::Uninvite(args) => session.uninvite(args),
        Command::Approve(args) => session.answer(args, true),
        Command::Deny(args) => session.answer(args, false),
        Command::Show(args) => session.show(args),
        Command::List(args) => session.list(args),
        Command::Invitations(args) => session.invitations(args),
        Command::Events(args) => session.events(args),
        Command::Verify => session.verify(),
        Command::Serve(args) => serve(session, config, args),
    }
}

/// The config file is a server config; its `[agenda]` table drives every
/// command. `--journal` wins over the file.
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(journal) = &cli.journal {
        config.agenda.journal_path = Some(journal.clone());
    }
    Ok(config)
}

fn parse_identity(value: &str) -> anyhow::Result<Identity> {
    value
        .parse::<Identity>()
        .with_context(|| format!("invalid identity {value:?}"))
}

fn parse_identities(values: &[String]) -> anyhow::Result<Vec<Identity>> {
    values.iter().map(|v| parse_identity(v)).collect()
}

fn parse_appointment(value: &str) -> anyhow::Result<AppointmentId> {
    value
        .parse::<AppointmentId>()
        .with_context(|| format!("invalid appointment id {value:?}"))
}

fn parse_invitation(value: &str) -> anyhow::Result<InvitationId> {
    value
        .parse::<InvitationId>()
        .with_context(|| format!("invalid invitation id {value:?}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct Session {
    agenda: Agenda,
    caller: Option<Identity>,
    format: OutputFormat,
}

impl Session {
    fn open(cli: &Cli, config: &ServerConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = match cli.at {
            Some(at) => Arc::new(ManualClock::new(Timestamp(at))),
            None => Arc::new(SystemClock::new(config.agenda.time_unit)),
        };
        let agenda = Agenda::open_with_clock(config.agenda.clone(), clock)?;
        let report = agenda.open_report();
        if report.truncated_bytes > 0 || report.skipped_frames > 0 {
            eprintln!(
                "{} journal recovery dropped {} bytes ({} damaged frames)",
                "warning:".yellow().bold(),
                report.truncated_bytes,
                report.skipped_frames
            );
        }
        let caller = cli.caller.as_deref().map(parse_identity).transpose()?;
        Ok(Self {
            agenda,
            caller,
            format: cli.format,
        })
    }

    fn caller(&self) -> anyhow::Result<&Identity> {
        self.caller
            .as_ref()
            .ok_or_else(|| anyhow!("this command needs a caller; pass --as IDENTITY"))
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn whoami(&self) -> anyhow::Result<()> {
        let me = self.caller()?;
        if self.json() {
            return print_json(&json!({ "identity": me.to_hex(), "short": me.short_id() }));
        }
        println!("{}", me.short_id().cyan().bold());
        println!("  {}", me.to_hex().dimmed());
        Ok(())
    }

    fn schedule(&self, args: ScheduleArgs) -> anyhow::Result<()> {
        let invitees = parse_identities(&args.invitees)?;
        let id = self.agenda.schedule(
            self.caller()?,
            Timestamp(args.from),
            Timestamp(args.to),
            invitees,
            args.recurring,
        )?;
        if self.json() {
            return print_json(&json!({ "id": id }));
        }
        println!(
            "{} Scheduled appointment {} ({}..{})",
            "✓".green().bold(),
            format!("#{id}").yellow(),
            args.from,
            args.to
        );
        Ok(())
    }

    fn unschedule(&self, args: AppointmentArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        self.agenda.unschedule(self.caller()?, id)?;
        if self.json() {
            return print_json(&json!({ "unscheduled": id }));
        }
        println!("{} Unscheduled {}", "✓".green().bold(), format!("#{id}").yellow());
        Ok(())
    }

    fn move_appointment(&self, args: MoveArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        self.agenda
            .move_appointment(self.caller()?, id, Timestamp(args.from), Timestamp(args.to))?;
        let appointment = self.agenda.appointment(id)?;
        if self.json() {
            return print_json(&appointment);
        }
        println!("{} Moved", "✓".green().bold());
        self.print_appointment(&appointment);
        Ok(())
    }

    fn invite(&self, args: InviteArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        let identities = parse_identities(&args.identities)?;
        let created = self.agenda.invite_members(self.caller()?, id, identities)?;
        if self.json() {
            return print_json(&json!({ "invitations": created }));
        }
        for invitation in created {
            let invitation = self.agenda.invitation(id, invitation)?;
            println!(
                "{} Invited {} as invitation {}",
                "✓".green().bold(),
                invitation.invitee.to_string().cyan(),
                invitation.id.to_string().yellow()
            );
        }
        Ok(())
    }

    fn uninvite(&self, args: UninviteArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        let invitation = parse_invitation(&args.invitation)?;
        let identities = parse_identities(&args.identities)?;
        self.agenda
            .uninvite_members(self.caller()?, id, invitation, identities)?;
        if self.json() {
            return print_json(&json!({ "uninvited": invitation }));
        }
        println!(
            "{} Withdrew invitation {} from {}",
            "✓".green().bold(),
            invitation.to_string().yellow(),
            format!("#{id}").yellow()
        );
        Ok(())
    }

    fn answer(&self, args: AnswerArgs, approve: bool) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        let invitation = parse_invitation(&args.invitation)?;
        let caller = self.caller()?;
        if approve {
            self.agenda.approve_invite(caller, id, invitation)?;
        } else {
            self.agenda.deny_invite(caller, id, invitation)?;
        }
        let invitation = self.agenda.invitation(id, invitation)?;
        if self.json() {
            return print_json(&invitation);
        }
        self.print_invitation(&invitation);
        Ok(())
    }

    fn show(&self, args: AppointmentArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        let appointment = self.agenda.appointment(id)?;
        let invitations = self.agenda.invitations(id)?;
        if self.json() {
            return print_json(&json!({
                "appointment": appointment,
                "invitations": invitations,
            }));
        }
        self.print_appointment(&appointment);
        if invitations.is_empty() {
            println!("  No invitations.");
        }
        for invitation in &invitations {
            self.print_invitation(invitation);
        }
        Ok(())
    }

    fn list(&self, args: ListArgs) -> anyhow::Result<()> {
        let owner = match &args.owner {
            Some(owner) => parse_identity(owner)?,
            None => self.caller()?.clone(),
        };
        let appointments = if args.upcoming {
            self.agenda.upcoming_of(&owner)?
        } else {
            self.agenda.appointments_of(&owner)?
        };
        if self.json() {
            return print_json(&appointments);
        }
        if appointments.is_empty() {
            println!("No appointments for {}.", owner.to_string().cyan());
        }
        for appointment in &appointments {
            self.print_appointment(appointment);
        }
        Ok(())
    }

    fn invitations(&self, args: AppointmentArgs) -> anyhow::Result<()> {
        let id = parse_appointment(&args.id)?;
        let invitations = self.agenda.invitations(id)?;
        if self.json() {
            return print_json(&invitations);
        }
        if invitations.is_empty() {
            println!("No invitations for {}.", format!("#{id}").yellow());
        }
        for invitation in &invitations {
            self.print_invitation(invitation);
        }
        Ok(())
    }

    fn events(&self, args: EventsArgs) -> anyhow::Result<()> {
        let filter = EventFilter {
            kinds: (!args.kind.is_empty())
                .then(|| args.kind.iter().copied().map(NotificationKind::from).collect()),
            appointments: args
                .appointment
                .as_deref()
                .map(parse_appointment)
                .transpose()?
                .map(|id| vec![id]),
            identities: args
                .identity
                .as_deref()
                .map(parse_identity)
                .transpose()?
                .map(|identity| vec![identity]),
        };
        let events = self.agenda.notifications_matching(args.after, &filter)?;
        if self.json() {
            return print_json(&events);
        }
        if events.is_empty() {
            println!("No notifications after #{}.", args.after);
        }
        for event in &events {
            print_event(event);
        }
        Ok(())
    }

    fn verify(&self) -> anyhow::Result<()> {
        let report = self.agenda.verify()?;
        if self.json() {
            print_json(&json!({
                "valid": report.is_valid(),
                "head_seq": report.head_seq,
                "notification_head": report.notification_head,
                "appointments": report.ledger.appointment_count,
                "invitations": report.ledger.invitation_count,
                "violations": report
                    .ledger
                    .violations
                    .iter()
                    .map(|v| v.description.clone())
                    .collect::<Vec<_>>(),
                "damaged_notifications": report.damaged_notifications,
            }))?;
        } else if report.is_valid() {
            println!("{} Agenda is consistent", "✓".green().bold());
            println!("  Journal head: {}", report.head_seq.to_string().bold());
            println!(
                "  Appointments: {}  Invitations: {}",
                report.ledger.appointment_count, report.ledger.invitation_count
            );
            println!("  Notifications: {}", report.notification_head);
        } else {
            println!("{} Agenda is inconsistent", "✗".red().bold());
            for violation in &report.ledger.violations {
                println!(
                    "  {} {}: {}",
                    format!("#{}", violation.appointment).yellow(),
                    format!("{:?}", violation.kind).red(),
                    violation.description
                );
            }
            for seq in &report.damaged_notifications {
                println!("  notification #{seq}: {}", "integrity hash mismatch".red());
            }
        }
        if report.is_valid() {
            Ok(())
        } else {
            Err(anyhow!("verification failed"))
        }
    }

    fn print_appointment(&self, appointment: &Appointment) {
        let mut flags = Vec::new();
        if appointment.recurring {
            flags.push("recurring".blue().to_string());
        }
        if appointment.is_past_at(self.agenda.now()) {
            flags.push("past".dimmed().to_string());
        }
        println!(
            "{}  {}..{}  owner {}  {}",
            format!("#{}", appointment.id).yellow().bold(),
            appointment.from,
            appointment.to,
            appointment.owner.to_string().cyan(),
            flags.join(" ")
        );
    }

    fn print_invitation(&self, invitation: &Invitation) {
        let status = match invitation.status {
            InvitationStatus::Pending => "pending".yellow(),
            InvitationStatus::Approved => "approved".green(),
            InvitationStatus::Denied => "denied".red(),
        };
        println!(
            "  invitation {} → {}  {}",
            invitation.id.to_string().bold(),
            invitation.invitee.to_string().cyan(),
            status
        );
    }
}

fn print_event(event: &FabricEvent) {
    println!(
        "{} {}  {}",
        format!("#{}", event.seq).yellow(),
        event.notification,
        event.short_hash().dimmed()
    );
}

fn serve(session: Session, mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    let bind = config.bind_addr;
    let server = AgendaServer::with_agenda(config, Arc::new(session.agenda));
    println!("{} Agenda server on {}", "✓".green().bold(), bind.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["agenda"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn commands_share_a_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("agenda.wal");
        let journal = journal.to_str().unwrap();

        run(&["--journal", journal, "--as", "alice", "--at", "0", "schedule", "--from", "10", "--to", "20", "--invite", "bob"]).unwrap();
        run(&["--journal", journal, "--as", "bob", "--at", "5", "approve", "1", "1"]).unwrap();
        run(&["--journal", journal, "--at", "5", "verify"]).unwrap();

        let agenda = Agenda::open(agenda_sdk::AgendaConfig::with_journal(journal)).unwrap();
        assert_eq!(agenda.appointment_count().unwrap(), 1);
        let invitation = agenda.invitation(AppointmentId(1), InvitationId(1)).unwrap();
        assert_eq!(invitation.status, InvitationStatus::Approved);
    }

    #[test]
    fn mutations_need_a_caller() {
        let err = run(&["schedule", "--from", "1", "--to", "2"]).unwrap_err();
        assert!(err.to_string().contains("--as"));
    }

    #[test]
    fn denials_surface_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("agenda.wal");
        let journal = journal.to_str().unwrap();

        run(&["--journal", journal, "--as", "alice", "--at", "0", "schedule", "--from", "10", "--to", "20"]).unwrap();
        assert!(run(&["--journal", journal, "--as", "mallory", "--at", "0", "unschedule", "1"]).is_err());
        assert!(run(&["--journal", journal, "--as", "alice", "--at", "30", "move", "1", "--from", "40", "--to", "50"]).is_err());
        run(&["--journal", journal, "--as", "alice", "--at", "0", "unschedule", "#1"]).unwrap();
    }

    #[test]
    fn bad_identity_is_reported() {
        let err = run(&["--as", "id:beef", "whoami"]).unwrap_err();
        assert!(err.to_string().contains("invalid identity"));
    }
}
