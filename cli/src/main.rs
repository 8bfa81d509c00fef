//! Appointment portal command line front end
//!
//! Every command is one "page load": the signed-in session is restored from
//! the snapshot file, role commands pass through the page guard, and the
//! resulting state is saved again.
//!
//! ```sh
//! # Register, then wait for an admin
//! portal register --name Ann --email ann@example.com --password secret1
//!
//! # Default admin approves
//! portal login --email admin@example.com --password admin123
//! portal students pending
//! portal students approve <uid>
//!
//! # Validate config without running anything
//! portal --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use appointment_portal::application::GuardExit;
use appointment_portal::domain::{
    AppointmentStatus, CreateTeacherDto, IdentityService, RegisterStudentDto, Role, RoleSet,
    UpdateTeacherDto,
};
use appointment_portal::{
    default_config_path, init_tracing, AppConfig, AuthContext, PageLocation, PortalHandle,
    PortalOptions,
};

/// Appointment portal: students book time with teachers, admins manage both.
#[derive(Parser, Debug)]
#[command(
    name = "portal",
    version,
    about = "Role-based appointment booking portal",
    long_about = "Appointment portal for students, teachers and admins.\n\n\
                  Default config: ~/.config/appointment-portal/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the snapshot file holding accounts, session and documents.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Skip creating the default admin user.
    #[arg(long)]
    no_admin: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register as a student (needs admin approval before login)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and print the dashboard to open
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out
    Logout {
        /// Page the logout happens on
        #[arg(long, default_value = "/index.html")]
        page: String,
    },
    /// Load a page through the guard and report the outcome
    Visit {
        /// Page path, e.g. /student/dashboard.html
        page: String,
        /// Roles the page admits; defaults to the page's area
        #[arg(long = "allow", value_parser = parse_role)]
        allow: Vec<Role>,
    },
    /// Student approvals (admin)
    #[command(subcommand)]
    Students(StudentsCommand),
    /// Teacher management (admin)
    #[command(subcommand)]
    Teachers(TeachersCommand),
    /// Own availability (teacher)
    #[command(subcommand)]
    Slots(SlotsCommand),
    /// Own appointments (teacher)
    #[command(subcommand)]
    Appointments(AppointmentsCommand),
    /// Search teachers by name, department or subject (student)
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    /// Show a teacher's bookable slots (student)
    Booking { teacher_id: String },
    /// Book a slot (student)
    Book {
        teacher_id: String,
        /// RFC 3339 instant, e.g. 2026-11-02T09:00:00Z
        slot: DateTime<Utc>,
        #[arg(long, default_value = "")]
        purpose: String,
    },
    /// Own appointments (student)
    MyAppointments,
}

#[derive(Subcommand, Debug)]
enum StudentsCommand {
    Pending,
    Approve { uid: String },
}

#[derive(Subcommand, Debug)]
enum TeachersCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        subject: String,
    },
    List,
    Update {
        uid: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        subject: String,
    },
    Delete {
        uid: String,
    },
}

#[derive(Subcommand, Debug)]
enum SlotsCommand {
    Add { slot: DateTime<Utc> },
    List,
}

#[derive(Subcommand, Debug)]
enum AppointmentsCommand {
    List,
    /// Approve or cancel a pending appointment
    Decide {
        id: String,
        /// approved | cancelled
        status: AppointmentStatus,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse().map_err(|e: appointment_portal::domain::DomainError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref path) = cli.snapshot {
        config.storage.snapshot_path = Some(path.clone());
    }

    init_tracing(&config);
    match &load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    let snapshot_path = config.snapshot_path(&config_path);

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Some(e) = load_error {
            return Err(e.into());
        }
        println!("Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   Snapshot      : {}", snapshot_path.display());
        println!("   Login entry   : {}", config.portal.login_entry);
        println!("   Lookup failure: {:?}", config.portal.on_lookup_failure);
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    let Some(command) = cli.command else {
        println!("No command given; see `portal --help`.");
        return Ok(());
    };

    let portal = PortalHandle::open(PortalOptions {
        config,
        snapshot_path,
        create_default_admin: !cli.no_admin,
    })
    .await?;

    let outcome = run(&portal, command).await;

    for target in portal.navigator.redirects() {
        println!("-> {}", target);
    }
    portal.save().await?;

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(portal: &PortalHandle, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let session = portal
                .accounts
                .register(RegisterStudentDto::new(&name, &email, &password))
                .await?;
            println!("Registered {} ({})", session.email, session.uid);
        }
        Command::Login { email, password } => {
            let login = portal.accounts.login(&email, &password).await?;
            println!(
                "Logged in as {} ({})",
                login.profile.name, login.profile.role
            );
        }
        Command::Logout { page } => {
            portal.accounts.logout(&PageLocation::new(page)).await?;
            println!("Logged out");
        }
        Command::Visit { page, allow } => {
            let page = PageLocation::new(page);
            if !page.is_restricted() && portal.identity.current_session().is_none() {
                println!("{}: public page, nobody signed in", page.path());
                return Ok(());
            }
            let allowed: RoleSet = if allow.is_empty() {
                page.area().into_iter().collect()
            } else {
                allow.into_iter().collect()
            };
            let mut guard = portal.protect(page.clone(), allowed);
            match guard.ready().await {
                Some(context) => println!(
                    "{}: authorized as {} ({})",
                    page.path(),
                    context.name(),
                    context.role()
                ),
                None => println!("{}: {:?}", page.path(), guard.join().await),
            }
        }
        Command::Students(cmd) => {
            let admin = portal.admin_page(enter(portal, Role::Admin).await?)?;
            match cmd {
                StudentsCommand::Pending => {
                    for student in admin.pending_students().await? {
                        println!("{}  {}  {}", student.id, student.data.name, student.data.email);
                    }
                }
                StudentsCommand::Approve { uid } => {
                    admin.approve_student(&uid).await?;
                    println!("Approved {}", uid);
                }
            }
        }
        Command::Teachers(cmd) => {
            let admin = portal.admin_page(enter(portal, Role::Admin).await?)?;
            match cmd {
                TeachersCommand::Add {
                    name,
                    email,
                    password,
                    department,
                    subject,
                } => {
                    let uid = admin
                        .add_teacher(CreateTeacherDto::new(
                            &name,
                            &email,
                            &password,
                            &department,
                            &subject,
                        ))
                        .await?;
                    println!("Added teacher {}", uid);
                }
                TeachersCommand::List => {
                    for teacher in admin.teachers().await? {
                        print_teacher(&teacher.id, &teacher.data);
                    }
                }
                TeachersCommand::Update {
                    uid,
                    name,
                    department,
                    subject,
                } => {
                    admin
                        .update_teacher(&uid, UpdateTeacherDto::new(&name, &department, &subject))
                        .await?;
                    println!("Updated {}", uid);
                }
                TeachersCommand::Delete { uid } => {
                    admin.delete_teacher(&uid).await?;
                    println!("Deleted {}", uid);
                }
            }
        }
        Command::Slots(cmd) => {
            let teacher = portal.teacher_page(enter(portal, Role::Teacher).await?)?;
            match cmd {
                SlotsCommand::Add { slot } => {
                    teacher.add_slot(slot).await?;
                    println!("Added {}", slot.to_rfc3339());
                }
                SlotsCommand::List => {
                    for slot in teacher.schedule().await? {
                        println!("{}", slot.to_rfc3339());
                    }
                }
            }
        }
        Command::Appointments(cmd) => {
            let teacher = portal.teacher_page(enter(portal, Role::Teacher).await?)?;
            match cmd {
                AppointmentsCommand::List => {
                    for appt in teacher.appointments().await? {
                        println!(
                            "{}  {}  {}  {}  {}",
                            appt.id,
                            appt.data.date_time.to_rfc3339(),
                            appt.data.student_name,
                            appt.data.status,
                            appt.data.purpose
                        );
                    }
                }
                AppointmentsCommand::Decide { id, status } => {
                    let appt = teacher.decide(&id, status).await?;
                    println!("{} is now {}", id, appt.status);
                }
            }
        }
        Command::Search { term } => {
            let student = portal.student_page(enter(portal, Role::Student).await?)?;
            for teacher in student.search_teachers(&term).await? {
                print_teacher(&teacher.id, &teacher.data);
            }
        }
        Command::Booking { teacher_id } => {
            let student = portal.student_page(enter(portal, Role::Student).await?)?;
            let options = student.booking_options(&teacher_id).await?;
            println!("Book with {}", options.teacher_name);
            if options.slots.is_empty() {
                println!("   (no available slots)");
            }
            for slot in options.slots {
                println!("   {}", slot.to_rfc3339());
            }
        }
        Command::Book {
            teacher_id,
            slot,
            purpose,
        } => {
            let student = portal.student_page(enter(portal, Role::Student).await?)?;
            let id = student.book(&teacher_id, slot, &purpose).await?;
            println!("Booked appointment {}", id);
        }
        Command::MyAppointments => {
            let student = portal.student_page(enter(portal, Role::Student).await?)?;
            for appt in student.appointments().await? {
                println!(
                    "{}  {}  {}  {}",
                    appt.id,
                    appt.data.date_time.to_rfc3339(),
                    appt.data.teacher_name,
                    appt.data.status
                );
            }
        }
    }
    Ok(())
}

/// Load the role's dashboard through the guard.
async fn enter(portal: &PortalHandle, role: Role) -> Result<Arc<AuthContext>, Box<dyn std::error::Error>> {
    let page = PageLocation::in_area(role, "dashboard.html");
    let mut guard = portal.protect(page, [role]);
    match guard.ready().await {
        Some(context) => Ok(context),
        None => match guard.join().await {
            GuardExit::Redirected { reason, .. } => {
                Err(format!("access denied: {}", reason.as_str()).into())
            }
            other => Err(format!("page not loaded: {:?}", other).into()),
        },
    }
}

fn print_teacher(id: &str, profile: &appointment_portal::domain::Profile) {
    println!(
        "{}  {}  {}  {}",
        id,
        profile.name,
        profile.department.as_deref().unwrap_or("-"),
        profile.subject.as_deref().unwrap_or("-")
    );
}
