use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, MoneyCents, Piggybank, PiggybankTransactionCmd, PiggybankTransactionKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "piggybank_admin")]
#[command(about = "Admin utilities for the piggybank service (users, savings maintenance)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./piggybank.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Piggybank(PiggybankArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct PiggybankArgs {
    #[command(subcommand)]
    command: PiggybankCommand,
}

#[derive(Subcommand, Debug)]
enum PiggybankCommand {
    /// Print the piggybanks of a user, main first.
    List(OwnerArgs),
    /// Rebuild the main piggybank from the monthly surpluses.
    Recompute(OwnerArgs),
    /// Overwrite the main piggybank balance with income minus expenses.
    Sync(OwnerArgs),
    /// Replay every piggybank log and report cached balances that drifted.
    Verify(OwnerArgs),
    /// Put money into a piggybank.
    Deposit(MovementArgs),
    /// Take money out of a piggybank.
    Withdraw(MovementArgs),
}

#[derive(Args, Debug)]
struct OwnerArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct MovementArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    piggybank: Uuid,
    /// Amount such as `12.34` or `12,5`.
    #[arg(long, value_parser = parse_amount)]
    amount: MoneyCents,
    #[arg(long, default_value = "manual adjustment")]
    description: String,
}

fn parse_amount(raw: &str) -> Result<MoneyCents, String> {
    raw.parse::<MoneyCents>().map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn require_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if users::Entity::find_by_id(username.to_string())
        .one(db)
        .await?
        .is_none()
    {
        return Err(format!("user not found: {username}").into());
    }
    Ok(())
}

fn format_piggybank(piggybank: &Piggybank) -> String {
    let marker = if piggybank.is_main { "*" } else { " " };
    let mut line = format!(
        "{marker} {} {:<24} {:>12}",
        piggybank.id,
        piggybank.name,
        MoneyCents::new(piggybank.amount_minor)
    );
    if piggybank.target_amount_minor > 0 {
        line.push_str(&format!(
            " / {} ({:.1}%)",
            MoneyCents::new(piggybank.target_amount_minor),
            piggybank.percentage_to_target()
        ));
    }
    line
}

async fn run_piggybank_command(
    engine: &Engine,
    command: PiggybankCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        PiggybankCommand::List(args) => {
            let summary = engine.piggybank_summary(&args.user).await?;
            for piggybank in &summary.piggybanks {
                println!("{}", format_piggybank(piggybank));
            }
            println!(
                "{} piggybanks, total {}",
                summary.count,
                MoneyCents::new(summary.total_amount_minor)
            );
        }
        PiggybankCommand::Recompute(args) => {
            let summary = engine.recompute_monthly_balance(&args.user).await?;
            println!(
                "processed {} months, main piggybank now holds {}",
                summary.months_processed,
                MoneyCents::new(summary.total_savings_minor)
            );
        }
        PiggybankCommand::Sync(args) => match engine.sync_main_piggybank(&args.user).await? {
            Some(main) => println!("{}", format_piggybank(&main)),
            None => println!("no main piggybank for {}", args.user),
        },
        PiggybankCommand::Verify(args) => {
            let mut drifted = 0;
            for piggybank in engine.list_piggybanks(&args.user).await? {
                let check = engine
                    .verify_piggybank_ledger(&args.user, piggybank.id)
                    .await?;
                if !check.is_consistent() {
                    drifted += 1;
                    tracing::warn!(
                        piggybank = %piggybank.id,
                        cached = check.cached_minor,
                        derived = check.derived_minor,
                        "piggybank balance does not match its log"
                    );
                    println!(
                        "{}: cached {} derived {}",
                        piggybank.name,
                        MoneyCents::new(check.cached_minor),
                        MoneyCents::new(check.derived_minor)
                    );
                }
            }
            if drifted > 0 {
                return Err(format!("{drifted} piggybanks out of sync").into());
            }
            println!("all piggybanks consistent");
        }
        PiggybankCommand::Deposit(args) => {
            move_money(engine, args, PiggybankTransactionKind::Deposit).await?;
        }
        PiggybankCommand::Withdraw(args) => {
            move_money(engine, args, PiggybankTransactionKind::Withdrawal).await?;
        }
    }
    Ok(())
}

async fn move_money(
    engine: &Engine,
    args: MovementArgs,
    kind: PiggybankTransactionKind,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let entry = engine
        .new_piggybank_transaction(PiggybankTransactionCmd::new(
            args.user.clone(),
            args.piggybank,
            kind,
            args.amount.cents(),
            args.description,
        ))
        .await?;
    let piggybank = engine.piggybank(&args.user, args.piggybank).await?;
    println!(
        "{} {} {}",
        entry.transaction.kind.as_str(),
        MoneyCents::new(entry.transaction.amount_minor),
        entry.piggybank_name
    );
    println!("{}", format_piggybank(&piggybank));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("piggybank_admin=info,engine=info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Piggybank(PiggybankArgs { command }) => {
            let owner = match &command {
                PiggybankCommand::List(args)
                | PiggybankCommand::Recompute(args)
                | PiggybankCommand::Sync(args)
                | PiggybankCommand::Verify(args) => args.user.clone(),
                PiggybankCommand::Deposit(args) | PiggybankCommand::Withdraw(args) => {
                    args.user.clone()
                }
            };
            require_user(&db, &owner).await?;

            let engine = Engine::builder().database(db.clone()).build().await?;
            run_piggybank_command(&engine, command).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_argument_is_parsed_as_money() {
        assert_eq!(parse_amount("12.34").unwrap().cents(), 12_34);
        assert_eq!(parse_amount("7,5").unwrap().cents(), 7_50);
        assert!(parse_amount("1.234").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn deposit_command_line() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "piggybank_admin",
            "piggybank",
            "deposit",
            "--user",
            "alice",
            "--piggybank",
            &id.to_string(),
            "--amount",
            "20.05",
        ])
        .unwrap();
        let Command::Piggybank(PiggybankArgs {
            command: PiggybankCommand::Deposit(args),
        }) = cli.command
        else {
            panic!("expected a deposit command");
        };
        assert_eq!(args.piggybank, id);
        assert_eq!(args.amount.cents(), 20_05);
        assert_eq!(args.description, "manual adjustment");
    }
}
