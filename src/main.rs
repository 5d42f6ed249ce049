use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use invoice_archive::auth::{self, Session, Sessions};
use invoice_archive::config::{
    config_dir, load_config, resolve_path, Config, CONFIG_TEMPLATE, DEFAULT_CATEGORIES,
};
use invoice_archive::domain::money::{format_amount, parse_amount};
use invoice_archive::error::{ArchiveError, Result};
use invoice_archive::invoice::{
    derive_payment_reference, generate_filename, Archive, InvoiceView, SupplierChoice, Upload,
    PDF_CONTENT_TYPE,
};
use invoice_archive::repository::{CategoryRepository, TomlStore};
use invoice_archive::storage::FsFileStore;
use invoice_archive::{PaymentStatus, PaymentUpdate};

#[derive(Parser)]
#[command(name = "archive")]
#[command(version, about = "Minimal CLI archive for supplier invoices", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.invoice-archive)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory, storage and default categories
    Init,

    /// Create a login account
    AddUser {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ARCHIVE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and start a session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ARCHIVE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show storage locations and session state
    Status,

    /// List known suppliers
    Suppliers,

    /// List available categories
    Categories,

    /// Archive a PDF invoice
    Upload {
        /// PDF file to archive
        file: PathBuf,

        /// Invoice date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Supplier name (created if unknown)
        #[arg(long, conflicts_with = "supplier_id", required_unless_present = "supplier_id")]
        supplier: Option<String>,

        /// Id of an existing supplier
        #[arg(long)]
        supplier_id: Option<Uuid>,

        /// Invoice number assigned by the supplier
        #[arg(short, long)]
        number: String,

        #[arg(short, long)]
        description: String,

        /// Total amount (e.g. 125.50 or 125,50)
        #[arg(short, long)]
        amount: String,

        /// Payment status (not-paid, partially-paid, paid)
        #[arg(long, default_value = "not-paid")]
        status: String,

        /// Amount already paid, for partially paid invoices
        #[arg(long)]
        partial_amount: Option<String>,

        /// Date of the partial payment (YYYY-MM-DD)
        #[arg(long)]
        partial_date: Option<String>,

        /// Category name or id
        #[arg(short, long)]
        category: Option<String>,

        /// Declared MIME type (default: guessed from the file extension)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// List archived invoices, newest first
    List {
        /// Show only the N most recent invoices
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one invoice in detail
    Show {
        /// Invoice index from 'list' (e.g., 1) or invoice id
        invoice: String,
    },

    /// Print the canonical filename of an invoice
    Name {
        /// Invoice index from 'list' (e.g., 1) or invoice id
        invoice: String,
    },

    /// Print the bank-transfer reference of an invoice
    Reference {
        /// Invoice index from 'list' (e.g., 1) or invoice id
        invoice: String,
    },

    /// Update the payment status of an invoice
    Pay {
        /// Invoice index from 'list' (e.g., 1) or invoice id
        invoice: String,

        /// Payment status (not-paid, partially-paid, paid)
        #[arg(long)]
        status: String,

        #[arg(long)]
        partial_amount: Option<String>,

        /// Date of the partial payment (YYYY-MM-DD)
        #[arg(long)]
        partial_date: Option<String>,
    },

    /// Delete an invoice and its stored PDF
    Delete {
        /// Invoice index from 'list' (e.g., 1) or invoice id
        invoice: String,
    },

    /// Preview the filename and transfer reference for invoice details
    Preview {
        /// Invoice date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        #[arg(long)]
        supplier: String,

        #[arg(short, long)]
        number: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        amount: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::AddUser { email, password } => cmd_add_user(&cfg_dir, &email, &password),
        Commands::Login { email, password } => cmd_login(&cfg_dir, &email, &password),
        Commands::Logout => cmd_logout(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Suppliers => cmd_suppliers(&cfg_dir),
        Commands::Categories => cmd_categories(&cfg_dir),
        Commands::Upload {
            file,
            date,
            supplier,
            supplier_id,
            number,
            description,
            amount,
            status,
            partial_amount,
            partial_date,
            category,
            content_type,
        } => {
            let supplier = match (supplier_id, supplier) {
                (Some(id), _) => SupplierChoice::Existing(id),
                (None, Some(name)) => SupplierChoice::New(name),
                (None, None) => return Err(ArchiveError::EmptySupplierName),
            };
            cmd_upload(
                &cfg_dir,
                UploadArgs {
                    file,
                    date,
                    supplier,
                    number,
                    description,
                    amount,
                    status,
                    partial_amount,
                    partial_date,
                    category,
                    content_type,
                },
            )
        }
        Commands::List { limit, json } => cmd_list(&cfg_dir, limit, json),
        Commands::Show { invoice } => cmd_show(&cfg_dir, &invoice),
        Commands::Name { invoice } => cmd_name(&cfg_dir, &invoice),
        Commands::Reference { invoice } => cmd_reference(&cfg_dir, &invoice),
        Commands::Pay {
            invoice,
            status,
            partial_amount,
            partial_date,
        } => cmd_pay(&cfg_dir, &invoice, &status, partial_amount, partial_date),
        Commands::Delete { invoice } => cmd_delete(&cfg_dir, &invoice),
        Commands::Preview {
            date,
            supplier,
            number,
            description,
            amount,
        } => cmd_preview(&date, &supplier, &number, &description, &amount),
    }
}

/// Everything a command needs once the config directory is known
struct Workspace {
    config: Config,
    store: Arc<TomlStore>,
    files: Arc<FsFileStore>,
    sessions: Sessions,
}

impl Workspace {
    fn open(cfg_dir: &Path) -> Result<Self> {
        let config = load_config(cfg_dir)?;
        let store = Arc::new(TomlStore::new(resolve_path(
            &config.storage.database,
            cfg_dir,
        )));
        let files = Arc::new(FsFileStore::new(resolve_path(
            &config.storage.upload_dir,
            cfg_dir,
        )));
        Ok(Self {
            config,
            store,
            files,
            sessions: Sessions::new(cfg_dir.join("session.toml")),
        })
    }

    fn archive(&self) -> Archive {
        Archive::with_store(self.store.clone(), self.files.clone())
    }

    fn require_login(&self) -> Result<Session> {
        self.sessions.require(self.store.as_ref())
    }

    fn money(&self, amount: rust_decimal::Decimal) -> String {
        format_amount(amount, &self.config.display.currency_symbol)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ArchiveError::InvalidDate(input.to_string()))
}

/// Declared MIME type for a file: explicit override, else by extension
fn declared_content_type(file: &Path, explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        let is_pdf = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            PDF_CONTENT_TYPE.to_string()
        } else {
            "application/octet-stream".to_string()
        }
    })
}

/// Resolve an invoice reference to its id.
/// Accepts either an index (1-based) from 'list' or the full invoice id.
fn resolve_invoice_id(archive: &Archive, reference: &str) -> Result<Uuid> {
    if let Ok(idx) = reference.parse::<usize>() {
        let invoices = archive.list()?;
        if idx == 0 || idx > invoices.len() {
            return Err(ArchiveError::InvalidInvoiceIndex(reference.to_string()));
        }
        return Ok(invoices[idx - 1].invoice.id);
    }

    Uuid::parse_str(reference).map_err(|_| ArchiveError::InvoiceNotFound(reference.to_string()))
}

/// Initialize config directory with template files and default categories
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(ArchiveError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    let workspace = Workspace::open(cfg_dir)?;
    fs::create_dir_all(workspace.files.root())?;
    for name in DEFAULT_CATEGORIES {
        if CategoryRepository::find_by_name(workspace.store.as_ref(), name)?.is_none() {
            CategoryRepository::create(workspace.store.as_ref(), name)?;
        }
    }
    info!(dir = %cfg_dir.display(), "initialized archive");

    println!("Initialized invoice archive at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Create an account:  archive add-user --email <email> --password <password>");
    println!("  2. Log in:             archive login --email <email> --password <password>");
    println!("  3. Archive invoices:   archive upload <file.pdf> --date YYYY-MM-DD --supplier <name> ...");

    Ok(())
}

fn cmd_add_user(cfg_dir: &Path, email: &str, password: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    let user = auth::register(
        workspace.store.as_ref(),
        email,
        password,
        workspace.config.auth.bcrypt_cost,
    )?;
    println!("Created user {}", user.email);
    Ok(())
}

fn cmd_login(cfg_dir: &Path, email: &str, password: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    let user = auth::authenticate(workspace.store.as_ref(), email, password)?;
    let session = workspace
        .sessions
        .start(&user, workspace.config.session.max_age_days)?;
    println!(
        "Logged in as {} (until {})",
        session.email,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

fn cmd_logout(cfg_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    if workspace.sessions.end()? {
        println!("Logged out");
    } else {
        println!("No active session");
    }
    Ok(())
}

fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    let data = workspace.store.load()?;

    println!("Archive Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Database:         {}", workspace.store.path().display());
    println!("Uploads:          {}", workspace.files.root().display());
    println!("Invoices:         {}", data.invoices.len());
    println!("Suppliers:        {}", data.suppliers.len());
    println!("Categories:       {}", data.categories.len());

    match workspace.require_login() {
        Ok(session) => println!(
            "Session:          {} (until {})",
            session.email,
            session.expires_at.format("%Y-%m-%d %H:%M UTC")
        ),
        Err(ArchiveError::SessionExpired) => println!("Session:          expired"),
        Err(_) => println!("Session:          not logged in"),
    }

    Ok(())
}

#[derive(Tabled)]
struct NamedRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "SUPPLIER")]
    supplier: String,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
}

fn cmd_suppliers(cfg_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    let suppliers = workspace.archive().suppliers()?;
    if suppliers.is_empty() {
        println!("No suppliers yet. They are created on upload with --supplier <name>.");
        return Ok(());
    }

    let rows: Vec<NamedRow> = suppliers
        .into_iter()
        .map(|s| NamedRow {
            name: s.name,
            id: s.id.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn cmd_categories(cfg_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    let categories = workspace.archive().categories()?;
    if categories.is_empty() {
        println!("No categories configured.");
        return Ok(());
    }

    let rows: Vec<NamedRow> = categories
        .into_iter()
        .map(|c| NamedRow {
            name: c.name,
            id: c.id.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

struct UploadArgs {
    file: PathBuf,
    date: String,
    supplier: SupplierChoice,
    number: String,
    description: String,
    amount: String,
    status: String,
    partial_amount: Option<String>,
    partial_date: Option<String>,
    category: Option<String>,
    content_type: Option<String>,
}

fn cmd_upload(cfg_dir: &Path, args: UploadArgs) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    // Parse everything at the boundary; the archive only sees typed values
    let date = parse_date(&args.date)?;
    let amount = parse_amount(&args.amount)?;
    let payment_status: PaymentStatus = args.status.parse()?;
    let partial_payment_amount = args.partial_amount.as_deref().map(parse_amount).transpose()?;
    let partial_payment_date = args.partial_date.as_deref().map(parse_date).transpose()?;
    let category_id = args
        .category
        .as_deref()
        .map(|c| archive.resolve_category(c))
        .transpose()?;

    let content_type = declared_content_type(&args.file, args.content_type);
    let original_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice.pdf".to_string());
    let bytes = fs::read(&args.file)?;

    let invoice = archive.upload(Upload {
        bytes,
        original_name,
        content_type,
        date,
        supplier: args.supplier,
        invoice_number: args.number,
        description: args.description,
        amount,
        payment_status,
        partial_payment_amount,
        partial_payment_date,
        category_id,
    })?;
    let view = archive.find(invoice.id)?;

    println!("Archived {}", view.invoice.invoice_number);
    println!("  Supplier: {}", view.supplier_name);
    println!("  Amount:   {}", workspace.money(view.invoice.amount));
    println!("  Name:     {}", view.filename());
    println!("  Saved:    {}", workspace.files.resolve(&view.invoice.file_path).display());

    Ok(())
}

fn invoice_row(index: usize, view: &InvoiceView, workspace: &Workspace) -> InvoiceRow {
    InvoiceRow {
        index,
        date: view.invoice.date.to_string(),
        supplier: view.supplier_name.clone(),
        number: view.invoice.invoice_number.clone(),
        description: view.invoice.description.clone(),
        amount: workspace.money(view.invoice.amount),
        status: view.invoice.payment_status.to_string(),
        category: view.category_name.clone().unwrap_or_default(),
    }
}

fn cmd_list(cfg_dir: &Path, limit: Option<usize>, json: bool) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;

    let invoices = workspace.archive().list()?;
    let total = invoices.len();
    let shown = match limit {
        Some(n) => &invoices[..n.min(total)],
        None => &invoices[..],
    };

    if json {
        let out = serde_json::to_string_pretty(shown)
            .map_err(|e| ArchiveError::Store(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if invoices.is_empty() {
        println!("No invoices archived yet.");
        return Ok(());
    }

    let rows: Vec<InvoiceRow> = shown
        .iter()
        .enumerate()
        .map(|(idx, view)| invoice_row(idx + 1, view, &workspace))
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
    println!("Total: {} invoices", total);
    println!("Use index number with show/name/reference/pay/delete (e.g., 'archive name 1')");

    Ok(())
}

fn cmd_show(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    let id = resolve_invoice_id(&archive, invoice_ref)?;
    let view = archive.find(id)?;
    let invoice = &view.invoice;

    println!("Invoice {}", invoice.invoice_number);
    println!("  Id:          {}", invoice.id);
    println!("  Date:        {}", invoice.date);
    println!("  Supplier:    {}", view.supplier_name);
    println!("  Description: {}", invoice.description);
    println!("  Amount:      {}", workspace.money(invoice.amount));
    println!("  Status:      {}", invoice.payment_status);
    if invoice.payment_status == PaymentStatus::PartiallyPaid {
        if let Some(partial) = invoice.partial_payment_amount {
            println!("  Paid so far: {}", workspace.money(partial));
        }
        if let Some(date) = invoice.partial_payment_date {
            println!("  Paid on:     {}", date);
        }
    }
    if let Some(category) = &view.category_name {
        println!("  Category:    {}", category);
    }
    println!("  File:        {}", workspace.files.resolve(&invoice.file_path).display());
    println!("  Name:        {}", view.filename());
    println!("  Reference:   {}", view.payment_reference());

    Ok(())
}

fn cmd_name(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    let id = resolve_invoice_id(&archive, invoice_ref)?;
    println!("{}", archive.filename(id)?);
    Ok(())
}

fn cmd_reference(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    let id = resolve_invoice_id(&archive, invoice_ref)?;
    println!("{}", archive.payment_reference(id)?);
    Ok(())
}

fn cmd_pay(
    cfg_dir: &Path,
    invoice_ref: &str,
    status: &str,
    partial_amount: Option<String>,
    partial_date: Option<String>,
) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    let update = PaymentUpdate {
        status: status.parse()?,
        partial_payment_amount: partial_amount.as_deref().map(parse_amount).transpose()?,
        partial_payment_date: partial_date.as_deref().map(parse_date).transpose()?,
    };

    let id = resolve_invoice_id(&archive, invoice_ref)?;
    let invoice = archive.update_payment(id, update)?;

    println!(
        "Marked {} as {}",
        invoice.invoice_number, invoice.payment_status
    );
    Ok(())
}

fn cmd_delete(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let workspace = Workspace::open(cfg_dir)?;
    workspace.require_login()?;
    let archive = workspace.archive();

    let id = resolve_invoice_id(&archive, invoice_ref)?;
    let invoice = archive.delete(id)?;

    println!("Deleted {}", invoice.invoice_number);
    Ok(())
}

/// Live preview: no config, no session, nothing stored
fn cmd_preview(
    date: &str,
    supplier: &str,
    number: &str,
    description: &str,
    amount: &str,
) -> Result<()> {
    let filename = generate_filename(
        parse_date(date)?,
        supplier,
        number,
        description,
        parse_amount(amount)?,
    );

    println!("Name:      {}", filename);
    println!("Reference: {}", derive_payment_reference(&filename));
    Ok(())
}
