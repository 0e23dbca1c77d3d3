//! Administrative CLI over the tablet task store.

mod cli;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tablet_db_core::config::DbConfig;
use tablet_db_core::storedvar::StoredVar;
use tablet_db_core::task::{LockState, SessionState, Task, TaskFactory, PATIENT_FK_FIELDNAME};
use tablet_db_core::{Database, DbRecord, FieldType, Value};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, VarCommands};

fn load_config(cli: &Cli) -> anyhow::Result<DbConfig> {
    let mut config = match &cli.config {
        Some(path) => DbConfig::from_json_file(path)?,
        None => DbConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    Ok(config)
}

fn task_json(task: &dyn Task) -> serde_json::Value {
    serde_json::json!({
        "tablename": task.tablename(),
        "shortname": task.shortname(),
        "complete": task.is_complete(),
        "record": task.object().to_json(),
    })
}

fn run_var(db: &Database, command: VarCommands) -> anyhow::Result<()> {
    StoredVar::make_table(db)?;
    match command {
        VarCommands::List => {
            for name in StoredVar::names(db)? {
                println!("{}", name);
            }
        }
        VarCommands::Get { name } => match StoredVar::load(db, &name)? {
            Some(var) => println!("{} ({}) = {}", var.name(), var.ty(), var.value()),
            None => bail!("No stored variable '{}'", name),
        },
        VarCommands::Set { name, ty, value } => {
            let ty: FieldType = ty.parse()?;
            if !matches!(
                ty,
                FieldType::Integer | FieldType::Boolean | FieldType::Real | FieldType::Text
            ) {
                bail!("Stored variables cannot hold type '{}'", ty);
            }
            let value = Value::from(value).convert(ty);
            if value.is_null() {
                bail!("Value does not convert to {}", ty);
            }
            let mut var = StoredVar::open(db, &name, ty, Value::Null)?;
            var.set_value(db, value)?;
            println!("{} ({}) = {}", var.name(), var.ty(), var.value());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli)?;
    let db = Database::open(&config)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let mut factory = TaskFactory::new();
    tablet_db_tasks::register_all_tasks(&mut factory);

    match cli.command {
        Commands::Init => {
            let mut reports = factory.make_all_tables(&db)?;
            reports.push(StoredVar::make_table(&db)?);
            for report in reports {
                if report.created {
                    println!("{}: created", report.table);
                } else if !report.added_columns.is_empty() {
                    println!("{}: added {}", report.table, report.added_columns.join(", "));
                } else {
                    println!("{}: up to date", report.table);
                }
                for column in &report.unexpected_columns {
                    println!("{}: undeclared column {}", report.table, column);
                }
            }
        }
        Commands::Tasks => {
            for tablename in factory.tablenames() {
                println!(
                    "{}\t{}\t{}",
                    tablename,
                    factory.shortname(tablename).unwrap_or_default(),
                    factory.longname(tablename).unwrap_or_default()
                );
            }
        }
        Commands::Fetch {
            table,
            patient,
            locked,
            sort,
        } => {
            let lock_state = if locked {
                LockState::Locked
            } else {
                LockState::Unlocked
            };
            let session = SessionState::new(patient, lock_state);
            let tasks = factory.fetch(&db, &session, &table, sort)?;
            let json: Vec<_> = tasks.iter().map(|t| task_json(t.as_ref())).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::New { table, patient } => {
            let mut task = factory
                .create(&db, &table, None)?
                .ok_or_else(|| anyhow!("No task registered for table '{}'", table))?;
            task.make_tables(&db)?;
            if !task.is_anonymous() {
                let patient = patient.context("--patient is required for this task")?;
                task.object_mut().set_value(PATIENT_FK_FIELDNAME, patient);
            }
            task.save(&db)?;
            println!(
                "{}",
                task.object()
                    .pk_value()
                    .context("save did not allocate a primary key")?
            );
        }
        Commands::Var { command } => run_var(&db, command)?,
    }
    Ok(())
}
