// src/sink/google.rs

use anyhow::{anyhow, Context, Result};
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{a1_range, a1_sheet, Sink, ValueGrid, ValueInputMode};
use crate::auth::Authorizer;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Google Sheets v4 REST client authorised by a service account.
pub struct SheetsClient {
    http: Client,
    auth: Authorizer,
    base: Url,
}

impl SheetsClient {
    pub fn new(http: Client, auth: Authorizer) -> Result<Self> {
        Ok(Self {
            http,
            auth,
            base: Url::parse(SHEETS_API_BASE)?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.base, segments)
    }

    async fn authorised(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let header = self.auth.header_value().await?;
        Ok(req.header(AUTHORIZATION, header))
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot be a base URL", base))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets"])
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into an error carrying the API's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("{} failed: HTTP {}: {}", what, status, body.trim()))
}

fn titles(meta: SpreadsheetMeta) -> Vec<String> {
    meta.sheets.into_iter().map(|s| s.properties.title).collect()
}

impl Sink for SheetsClient {
    async fn list_sheets(&mut self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let mut url = self.endpoint(&[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        debug!(%url, "listing sheets");

        let req = self.authorised(self.http.get(url.clone())).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let meta: SpreadsheetMeta = check(resp, "spreadsheets.get")
            .await?
            .json()
            .await
            .context("parsing spreadsheet metadata")?;
        Ok(titles(meta))
    }

    async fn create_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let url = self.endpoint(&[&format!("{}:batchUpdate", spreadsheet_id)])?;
        let body = json!({
            "requests": [{
                "addSheet": { "properties": { "title": title } }
            }]
        });
        debug!(%url, title, "adding sheet");

        let req = self.authorised(self.http.post(url.clone()).json(&body)).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        check(resp, &format!("addSheet `{}`", title)).await?;
        Ok(())
    }

    async fn clear_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let range = a1_sheet(title);
        let url = self.endpoint(&[spreadsheet_id, "values", &format!("{}:clear", range)])?;
        debug!(%url, title, "clearing sheet");

        let req = self.authorised(self.http.post(url.clone()).json(&json!({}))).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        check(resp, &format!("values.clear `{}`", range)).await?;
        Ok(())
    }

    async fn write_range(
        &mut self,
        spreadsheet_id: &str,
        sheet_title: &str,
        top_left: &str,
        values: &ValueGrid,
        mode: ValueInputMode,
    ) -> Result<()> {
        let range = a1_range(sheet_title, top_left);
        let mut url = self.endpoint(&[spreadsheet_id, "values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", mode.as_str());
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        debug!(%url, rows = values.len(), "writing range");

        let req = self.authorised(self.http.put(url.clone()).json(&body)).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("PUT {} failed", url))?;
        check(resp, &format!("values.update `{}`", range)).await?;
        Ok(())
    }
}
