//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};
use courier_common_config::{ConfigLoader, CourierConfig};
use courier_http::{Client, Decoding, FilePart, FormField, Method, RequestOptions};

use crate::args::{parse_credentials, parse_decoding, parse_header, parse_json, parse_key_value, parse_method};
use crate::error::CliError;

/// Courier - evented HTTP client
///
/// Sends one request and prints the final body, or every lifecycle event
/// with `--events`.
#[derive(Debug, Parser)]
#[command(
    name = "courier",
    author,
    version,
    about,
    long_about = None,
    arg_required_else_help = true,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
    /// Request method (get, post, put, patch, delete, head)
    #[arg(value_parser = parse_method)]
    pub method: Method,

    /// Target URL; relative URLs resolve against the configured base URL
    #[arg(value_hint = ValueHint::Url)]
    pub url: String,

    /// Query parameter, appended after any already in the URL
    #[arg(short = 'q', long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value, action = ArgAction::Append)]
    pub query: Vec<(String, String)>,

    /// Request header
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header, action = ArgAction::Append)]
    pub headers: Vec<(String, String)>,

    /// Raw request body
    #[arg(short = 'd', long, conflicts_with_all = ["form", "json"])]
    pub data: Option<String>,

    /// Form field; `KEY=@path` attaches a file (requires --multipart)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_key_value, action = ArgAction::Append, conflicts_with = "json")]
    pub form: Vec<(String, String)>,

    /// JSON request body
    #[arg(long, value_parser = parse_json)]
    pub json: Option<serde_json::Value>,

    /// Send form fields as multipart/form-data
    #[arg(long, requires = "form")]
    pub multipart: bool,

    /// Basic credentials
    #[arg(short = 'u', long, value_name = "USER:PASS", value_parser = parse_credentials)]
    pub user: Option<(String, String)>,

    /// Response decoding (utf8, buffer, binary, base64)
    #[arg(long, value_parser = parse_decoding)]
    pub decoding: Option<Decoding>,

    /// Stop following after this many redirects
    #[arg(long, value_name = "N")]
    pub max_redirects: Option<u32>,

    /// Return redirect responses instead of following them
    #[arg(long)]
    pub no_follow: bool,

    /// Print every lifecycle event instead of the body
    #[arg(long)]
    pub events: bool,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, env = "COURIER_CONFIG_PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Load configuration from `--config`, or `.courier/config.yaml` in the
    /// working directory.
    pub fn load_config(&self) -> Result<CourierConfig, CliError> {
        let loader = ConfigLoader::default();
        let config = match &self.config {
            Some(path) => loader.load_from(path)?,
            None => loader.load()?,
        };
        Ok(config)
    }

    /// Translate the arguments into request options on `client`.
    pub fn request_options(&self, client: &Client) -> Result<RequestOptions, CliError> {
        let mut options = client.request(self.method, &self.url);

        for (name, value) in &self.query {
            options = options.query(name, value);
        }
        for (name, value) in &self.headers {
            options = options.header(name, value);
        }
        if let Some((username, password)) = &self.user {
            options = options.basic_auth(username, password);
        }

        if let Some(data) = &self.data {
            options = options.body(data.as_str());
        } else if let Some(json) = &self.json {
            options = options.json(json.clone());
        } else if !self.form.is_empty() {
            let fields = self
                .form
                .iter()
                .map(|(name, value)| Ok((name.clone(), self.form_field(value)?)))
                .collect::<Result<Vec<_>, CliError>>()?;
            options = options.form(fields).multipart(self.multipart);
        }

        if let Some(decoding) = self.decoding {
            options = options.decoding(decoding);
        }
        if let Some(limit) = self.max_redirects {
            options = options.max_redirects(limit);
        }
        if self.no_follow {
            options = options.follow_redirects(false);
        }

        Ok(options)
    }

    fn form_field(&self, value: &str) -> Result<FormField, CliError> {
        match value.strip_prefix('@') {
            Some(path) if self.multipart => {
                let data = std::fs::read(path).map_err(|e| CliError::io(format!("cannot read {path}"), e))?;
                let filename = std::path::Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string());
                Ok(FilePart::new(filename, "application/octet-stream", data).into())
            }
            _ => Ok(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use courier_http::{ClientConfig, RequestBody};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("courier").chain(args.iter().copied())).unwrap()
    }

    fn client() -> Client {
        Client::with_config(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_request() {
        let cli = parse(&[
            "post",
            "http://localhost:9000/",
            "-q",
            "q=balls",
            "-H",
            "X-Trace: on",
            "--form",
            "a=1",
            "-u",
            "danwrong:flange",
            "--max-redirects",
            "3",
            "--events",
        ]);

        assert_eq!(cli.method, Method::Post);
        assert_eq!(cli.query, vec![("q".to_string(), "balls".to_string())]);
        assert_eq!(cli.headers, vec![("X-Trace".to_string(), "on".to_string())]);
        assert_eq!(cli.user, Some(("danwrong".to_string(), "flange".to_string())));
        assert_eq!(cli.max_redirects, Some(3));
        assert!(cli.events);

        let options = cli.request_options(&client()).unwrap();
        assert_eq!(options.query, vec![("q".to_string(), "balls".to_string())]);
        assert_eq!(options.headers.get("x-trace"), Some("on"));
        assert_eq!(options.username.as_deref(), Some("danwrong"));
        assert_eq!(options.max_redirects, Some(3));
        assert_eq!(options.body, Some(RequestBody::form([("a", "1")])));
        assert!(!options.multipart);
    }

    #[test]
    fn test_data_conflicts_with_json() {
        let result = Cli::try_parse_from(["courier", "post", "http://x/", "-d", "a", "--json", "{}"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_multipart_requires_form() {
        let result = Cli::try_parse_from(["courier", "post", "http://x/", "--multipart"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(Cli::try_parse_from(["courier", "fetch", "http://x/"]).is_err());
    }

    #[test]
    fn test_json_body_and_flags() {
        let cli = parse(&["put", "http://x/", "--json", r#"{"a":1}"#, "--no-follow", "--decoding", "base64"]);
        let options = cli.request_options(&client()).unwrap();
        assert_eq!(options.body, Some(RequestBody::Json(serde_json::json!({ "a": 1 }))));
        assert!(!options.follow_redirects);
        assert_eq!(options.decoding, Decoding::Base64);
    }

    #[test]
    fn test_multipart_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, "file contents").unwrap();

        let value = format!("upload=@{}", path.display());
        let cli = parse(&["post", "http://x/", "--form", &value, "--multipart"]);
        let options = cli.request_options(&client()).unwrap();

        let Some(RequestBody::Form(fields)) = options.body else {
            panic!("expected form body");
        };
        assert_eq!(
            fields[0].1,
            FormField::File(FilePart::new("upload.txt", "application/octet-stream", "file contents"))
        );
        assert!(options.multipart);
    }

    #[test]
    fn test_at_sign_is_literal_without_multipart() {
        let cli = parse(&["post", "http://x/", "--form", "handle=@someone"]);
        let options = cli.request_options(&client()).unwrap();
        assert_eq!(options.body, Some(RequestBody::form([("handle", "@someone")])));
    }
}
