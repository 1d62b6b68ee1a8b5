//! Command-line surface and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use desk_client::DeskClient;
use desk_client::api::ListParams;
use desk_client::api::leads::LeadListParams;
use desk_types::{Doctype, Filter, FilterOp, Filters, ListQuery, Page};
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Query and update a Frappe-style CRM/HR/ERP backend")]
pub struct Cli {
    /// Config file (default: $DESK_CONFIG or ~/.desk/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL; overrides the config file and $DESK_BASE_URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List documents of a doctype
    List(ListArgs),
    /// Fetch one document
    Get { doctype: String, name: String },
    /// Create a document from a JSON object
    Insert { doctype: String, doc: String },
    /// Set one field; VALUE is JSON, or a bare string
    Set {
        doctype: String,
        name: String,
        field: String,
        value: String,
    },
    /// Delete a document
    Delete { doctype: String, name: String },
    /// List CRM leads
    Leads(LeadsArgs),
    /// Call a whitelisted server method
    Call {
        method: String,
        /// JSON object of arguments
        args: Option<String>,
        /// Use GET (arguments become query parameters)
        #[arg(long)]
        get: bool,
    },
    /// Show the logged-in user
    Whoami,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = Page::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
    #[arg(long)]
    pub search: Option<String>,
}

impl PageArgs {
    fn page(&self) -> Result<Page> {
        Ok(Page::new(self.page, self.page_size)?)
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub doctype: String,
    #[command(flatten)]
    pub paging: PageArgs,
    /// Field matched by --search (repeatable)
    #[arg(long = "search-field", value_name = "FIELD")]
    pub search_fields: Vec<String>,
    /// Column to return (repeatable; default: name)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,
    /// `field:op:value` filter (repeatable), e.g. `status:=:Open`
    #[arg(long = "filter", value_name = "FILTER", value_parser = parse_filter)]
    pub filters: Vec<Filter>,
    #[arg(long)]
    pub order_by: Option<String>,
}

#[derive(Args, Debug)]
pub struct LeadsArgs {
    #[command(flatten)]
    pub paging: PageArgs,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
}

/// Parse `field:op:value`. The value may itself contain colons.
pub fn parse_filter(raw: &str) -> Result<Filter, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected field:op:value, got `{raw}`"));
    };
    if field.trim().is_empty() {
        return Err("filter field must not be empty".to_string());
    }
    let op = FilterOp::parse(op).map_err(|e| e.to_string())?;
    Ok(Filter::new(field.trim(), op, parse_value(value)))
}

/// JSON if it parses, otherwise the raw text as a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn doctype(raw: &str) -> Result<Doctype> {
    Ok(Doctype::new(raw)?)
}

impl Command {
    pub async fn run(self, client: &DeskClient) -> Result<Value> {
        match self {
            Self::List(args) => list(client, args).await,
            Self::Get { doctype: dt, name } => Ok(client.get(&doctype(&dt)?, &name).await?),
            Self::Insert { doctype: dt, doc } => {
                let doc: Value = serde_json::from_str(&doc).context("document is not valid JSON")?;
                Ok(client.insert(&doctype(&dt)?, doc).await?)
            }
            Self::Set {
                doctype: dt,
                name,
                field,
                value,
            } => Ok(client
                .set_value(&doctype(&dt)?, &name, &field, parse_value(&value))
                .await?),
            Self::Delete { doctype: dt, name } => {
                client.delete(&doctype(&dt)?, &name).await?;
                Ok(json!({ "deleted": name }))
            }
            Self::Leads(args) => {
                let mut list = ListParams::new(args.paging.page()?);
                list.search = args.paging.search;
                let params = LeadListParams {
                    list,
                    status: args.status,
                    source: args.source,
                };
                Ok(serde_json::to_value(client.fetch_leads(&params).await?)?)
            }
            Self::Call { method, args, get } => call(client, &method, args.as_deref(), get).await,
            Self::Whoami => Ok(json!({ "user": client.current_user().await? })),
        }
    }
}

async fn list(client: &DeskClient, args: ListArgs) -> Result<Value> {
    let or_filters = match args.paging.search.as_deref() {
        Some(term) if !term.trim().is_empty() => {
            if args.search_fields.is_empty() {
                bail!("--search needs at least one --search-field");
            }
            let fields: Vec<&str> = args.search_fields.iter().map(String::as_str).collect();
            Filters::search(&fields, term)
        }
        _ => Filters::new(),
    };

    let mut query = ListQuery::new(doctype(&args.doctype)?)
        .with_fields(args.fields)
        .with_filters(args.filters.into_iter().collect())
        .with_or_filters(or_filters)
        .with_page(args.paging.page()?);
    if let Some(order_by) = args.order_by {
        query = query.with_order_by(order_by);
    }

    let page = client.fetch_page::<Value>(&query).await?;
    Ok(serde_json::to_value(page)?)
}

async fn call(client: &DeskClient, method: &str, args: Option<&str>, get: bool) -> Result<Value> {
    let args = match args {
        Some(raw) => serde_json::from_str(raw).context("arguments are not valid JSON")?,
        None => Value::Null,
    };
    if !get {
        return Ok(client.call(method, args).await?);
    }

    let query: Vec<(String, String)> = match args {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect(),
        _ => bail!("GET arguments must be a JSON object"),
    };
    let query: Vec<(&str, String)> = query.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    Ok(client.call_get(method, &query).await?)
}
