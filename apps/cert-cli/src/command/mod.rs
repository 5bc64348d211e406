use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use cert_client::CertClient;
use cert_client::service::application_form::AttachedForm;
use cert_client::service::application_form::dto::{FieldValidation, SubmissionOutcome};
use serde::Serialize;
use shared_types::CertificateId;

use crate::terminal::{TerminalForm, TerminalPage};

/// Parses a `NAME=VALUE` argument; only the first `=` separates
pub fn parse_field(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in `{arg}`"));
    }

    Ok((name.to_owned(), value.to_owned()))
}

/// Prints the collection as the service returned it
pub async fn list(client: &CertClient, out: &mut impl Write) -> anyhow::Result<()> {
    let certificates = client.certificate_api.list().await?;

    print_json(out, &certificates)
}

pub async fn get(client: &CertClient, id: CertificateId, out: &mut impl Write) -> anyhow::Result<()> {
    let certificate = client.certificate_api.get_by_id(id).await?;

    print_json(out, &certificate)
}

/// Submits the application through the form controller, feedback goes to `out`
pub async fn apply<W: Write + Send + 'static>(
    client: &CertClient,
    fields: Vec<(String, String)>,
    out: W,
) -> anyhow::Result<()> {
    let form = attach_terminal_form(client, fields, out)?;

    match form.submit().await {
        SubmissionOutcome::Success(certificate) => {
            tracing::info!(
                id = ?certificate.id(),
                status = ?certificate.status(),
                "Application accepted"
            );
            Ok(())
        }
        SubmissionOutcome::Failure(error) => {
            Err(error).context("certificate application was not accepted")
        }
        SubmissionOutcome::Invalid(fields) => {
            bail!("{} field(s) invalid, nothing was sent", fields.len())
        }
        SubmissionOutcome::AlreadySubmitting => bail!("a submission is already in progress"),
        SubmissionOutcome::Detached => bail!("form is no longer attached"),
    }
}

/// Submits `fields` as they are for immediate issuance and prints the created certificate
pub async fn one_click(
    client: &CertClient,
    fields: Vec<(String, String)>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let certificate = client
        .certificate_api
        .one_click_apply(fields.into_iter().collect())
        .await?;

    print_json(out, &certificate)
}

/// Saves the issued file of application `id`.
///
/// `output` may be a file or an existing directory; inside a directory, or without `output`,
/// the name the service suggests is used.
pub async fn download(
    client: &CertClient,
    id: CertificateId,
    output: Option<PathBuf>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let file = client.certificate_api.download(id).await?;

    let default_name = file
        .file_name
        .as_deref()
        .and_then(final_component)
        .unwrap_or_else(|| format!("certificate-{id}"));

    save(output, &default_name, &file.content, out)
}

/// Saves the stored file `name`, see [`download`] for `output`
pub async fn file(
    client: &CertClient,
    name: &str,
    output: Option<PathBuf>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let content = client.certificate_api.file(name).await?;

    let default_name = final_component(name).with_context(|| format!("no file name in `{name}`"))?;

    save(output, &default_name, &content, out)
}

/// Validates the given fields the way leaving them in the form would, without submitting
pub fn check<W: Write + Send + 'static>(
    client: &CertClient,
    fields: Vec<(String, String)>,
    out: W,
) -> anyhow::Result<()> {
    let names: Vec<String> = fields.iter().map(|(name, _)| name.to_owned()).collect();
    let form = attach_terminal_form(client, fields, out)?;

    let mut invalid = 0;
    for name in &names {
        match form.blur(name) {
            Some(FieldValidation::Valid) => {}
            Some(FieldValidation::Invalid { .. }) => invalid += 1,
            None => tracing::debug!(name, "Field has no validation rules"),
        }
    }

    if invalid > 0 {
        bail!("{invalid} field(s) invalid");
    }

    Ok(())
}

fn attach_terminal_form<W: Write + Send + 'static>(
    client: &CertClient,
    fields: Vec<(String, String)>,
    out: W,
) -> anyhow::Result<AttachedForm> {
    let form_config = &client.config().form;

    let form = Arc::new(TerminalForm::new(&form_config.fields, fields, out));
    let page = TerminalPage::new(form_config.form_id.to_owned(), form);

    client
        .application_form_controller()
        .attach(&page)
        .context("application form not present")
}

fn save(
    output: Option<PathBuf>,
    default_name: &str,
    content: &[u8],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let target = match output {
        Some(dir) if dir.is_dir() => dir.join(default_name),
        Some(path) => path,
        None => PathBuf::from(default_name),
    };

    std::fs::write(&target, content)
        .with_context(|| format!("failed to write {}", target.display()))?;
    tracing::info!(path = %target.display(), bytes = content.len(), "Certificate file saved");

    writeln!(out, "{}", target.display())?;

    Ok(())
}

/// Last path component, so a suggested name cannot leave the target directory
fn final_component(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;

    Ok(())
}
