//! Tabula CLI - schema checking and code generation

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tabula::codegen::Generator;
use tabula::storage::ddl::TableLayout;
use tabula::{Config, SchemaRegistry, TableDef};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Generate typed record modules from table schemas", long_about = None)]
struct Cli {
    /// Project directory holding tabula.yaml (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default tabula.yaml and an empty schema directory
    Init,

    /// Generate record modules from the schema directory
    Generate {
        /// Schema directory (overrides tabula.yaml)
        #[arg(long)]
        schemas: Option<PathBuf>,

        /// Output directory (overrides tabula.yaml)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Path of the runtime crate in generated `use` lines
        #[arg(long)]
        crate_path: Option<String>,
    },

    /// Validate every schema without writing anything
    Check,

    /// Print CREATE statements for a company
    Ddl {
        /// Company name used as the table prefix
        #[arg(short, long)]
        company: String,

        /// Only this table (all tables when omitted)
        table: Option<String>,
    },

    /// Show one table's fields
    Inspect {
        /// Table display name
        table: String,

        /// Print the parsed schema as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::discover(&cli.project)?;

    match cli.command {
        Commands::Init => init_project(&cli.project),
        Commands::Generate {
            schemas,
            out,
            crate_path,
        } => {
            let mut generator_config = config.generator;
            if let Some(schemas) = schemas {
                generator_config.schema_dir = schemas;
            }
            if let Some(out) = out {
                generator_config.out_dir = out;
            }
            if let Some(crate_path) = crate_path {
                generator_config.runtime_crate = crate_path;
            }
            generate(&cli.project, &generator_config)
        }
        Commands::Check => check(&load_registry(&cli.project, &config)?),
        Commands::Ddl { company, table } => {
            print_ddl(&load_registry(&cli.project, &config)?, &company, table.as_deref())
        }
        Commands::Inspect { table, json } => {
            inspect(&load_registry(&cli.project, &config)?, &table, json)
        }
    }
}

fn load_registry(project: &Path, config: &Config) -> anyhow::Result<SchemaRegistry> {
    let dir = project.join(&config.generator.schema_dir);
    SchemaRegistry::load(&dir).with_context(|| format!("loading schemas from {}", dir.display()))
}

fn init_project(project: &Path) -> anyhow::Result<()> {
    let path = project.join(tabula::config::FILE_NAME);
    if path.exists() {
        println!("{} already exists, leaving it alone.", path.display());
        return Ok(());
    }

    let config = Config::default();
    std::fs::create_dir_all(project.join(&config.generator.schema_dir))?;
    std::fs::write(&path, serde_yaml::to_string(&config)?)?;

    println!("Initialized tabula project at {}", project.display());
    println!();
    println!("  {}   - configuration", tabula::config::FILE_NAME);
    println!(
        "  {}/      - one YAML file per table",
        config.generator.schema_dir.display()
    );
    println!();
    println!("Then run: tabula generate");
    Ok(())
}

fn generate(project: &Path, config: &tabula::GeneratorConfig) -> anyhow::Result<()> {
    let generator = Generator::from_config(config, project)?;
    let report = generator.run()?;

    for path in &report.written {
        println!("  wrote  {}", path.display());
    }
    for path in &report.preserved {
        println!("  kept   {}", path.display());
    }
    println!(
        "{} table(s) generated into {}",
        generator.registry().len(),
        generator.out_dir().display()
    );
    Ok(())
}

fn check(registry: &SchemaRegistry) -> anyhow::Result<()> {
    registry.validate()?;
    println!("{} table(s) OK", registry.len());
    Ok(())
}

fn print_ddl(registry: &SchemaRegistry, company: &str, table: Option<&str>) -> anyhow::Result<()> {
    tabula::validation::validate_company_name(company)?;
    registry.validate()?;

    let tables: Vec<&TableDef> = match table {
        Some(name) => vec![registry.require(name)?],
        None => registry.list().collect(),
    };
    for def in tables {
        for statement in TableLayout::from_def(def)?.statements(company) {
            println!("{};\n", statement);
        }
    }
    Ok(())
}

fn inspect(registry: &SchemaRegistry, name: &str, json: bool) -> anyhow::Result<()> {
    let table = registry.require(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(table)?);
        return Ok(());
    }

    println!("{} (table {}) -> {}", table.name, table.id, table.struct_name());
    if let Some(description) = &table.description {
        println!("  {}", description);
    }
    println!();
    for field in &table.fields {
        let mut flags = Vec::new();
        if field.primary_key {
            flags.push("pk".to_string());
        }
        if field.required {
            flags.push("required".to_string());
        }
        if let Some(length) = field.length {
            flags.push(format!("len {}", length));
        }
        if let Some(relation) = &field.table_relation {
            flags.push(format!("-> {}.{}", relation.table, relation.field));
        }
        if field.flow_field {
            flags.push(format!(
                "flow {:?} of {}",
                field.calc_formula,
                field.source_table.as_deref().unwrap_or_default()
            ));
        }
        println!(
            "  {:<24} {:<10} {:<10} {}",
            field.name,
            field.field_type.to_string(),
            field.db_name(),
            flags.join(", ")
        );
    }
    for key in &table.keys {
        println!(
            "  key {}{}: {}",
            key.name,
            if key.unique { " (unique)" } else { "" },
            key.fields.join(", ")
        );
    }
    Ok(())
}
