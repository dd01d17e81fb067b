// Google Sheets v4 REST client.
// Opens one sheet of a spreadsheet and reads/writes whole rows.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::auth::{ServiceAccountKey, TokenProvider};
use super::{column_letter, records_from_values, Record, SheetBackend, SheetsError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct SpreadsheetInfo {
    #[serde(default)]
    sheets: Vec<SheetInfo>,
}

#[derive(Deserialize)]
struct SheetInfo {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// A single sheet of a Google spreadsheet.
pub struct GoogleSheetsClient {
    http: Client,
    auth: TokenProvider,
    spreadsheet_id: String,
    sheet_name: String,
    width: usize,
}

impl GoogleSheetsClient {
    /// Opens `sheet_name` in the spreadsheet, creating the sheet with a
    /// header row when it does not exist yet.
    pub async fn open(
        credentials_json: &str,
        spreadsheet_id: &str,
        sheet_name: &str,
        headers: &[&str],
    ) -> Result<Self, SheetsError> {
        let http = Client::builder().build()?;
        let key = ServiceAccountKey::from_json(credentials_json)?;
        let auth = TokenProvider::new(http.clone(), key)?;

        let client = Self {
            http,
            auth,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            width: headers.len(),
        };
        client.ensure_sheet(headers).await?;

        Ok(client)
    }

    async fn ensure_sheet(&self, headers: &[&str]) -> Result<(), SheetsError> {
        let mut url = self.spreadsheet_url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let info: SpreadsheetInfo = self.send(self.http.get(url)).await?.json().await?;
        if info
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == self.sheet_name)
        {
            tracing::info!("Using sheet '{}' of spreadsheet {}", self.sheet_name, self.spreadsheet_id);
            return Ok(());
        }

        tracing::info!("Creating sheet '{}' in spreadsheet {}", self.sheet_name, self.spreadsheet_id);
        let url = self.spreadsheet_url(&[])?;
        let url = Url::parse(&format!("{}:batchUpdate", url))
            .map_err(|e| SheetsError::Url(e.to_string()))?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": self.sheet_name } } }]
        });
        self.send(self.http.post(url).json(&body)).await?;

        let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        self.write_range(&self.row_range(1), &header_row).await
    }

    fn spreadsheet_url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| SheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Url(SHEETS_API_BASE.to_string()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn quoted_sheet(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    fn data_range(&self) -> String {
        format!("{}!A:{}", self.quoted_sheet(), column_letter(self.width))
    }

    fn row_range(&self, row_number: usize) -> String {
        format!(
            "{}!A{row}:{}{row}",
            self.quoted_sheet(),
            column_letter(self.width),
            row = row_number
        )
    }

    async fn write_range(&self, range: &str, values: &[String]) -> Result<(), SheetsError> {
        let mut url = self.spreadsheet_url(&["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: vec![values.to_vec()],
        };
        self.send(self.http.put(url).json(&body)).await?;
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        check_response(response).await
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response, SheetsError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let status = response.status();
            Err(SheetsError::Auth(format!(
                "{}: {}",
                status,
                response.text().await.unwrap_or_default()
            )))
        }
        status => Err(SheetsError::Api {
            status,
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl SheetBackend for GoogleSheetsClient {
    async fn read_records(&self) -> Result<Vec<Record>, SheetsError> {
        let url = self.spreadsheet_url(&["values", &self.data_range()])?;
        let range: ValueRange = self.send(self.http.get(url)).await?.json().await?;
        Ok(records_from_values(range.values))
    }

    async fn append_row(&self, values: &[String]) -> Result<(), SheetsError> {
        let append = format!("{}:append", self.data_range());
        let mut url = self.spreadsheet_url(&["values", &append])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = ValueRange {
            range: None,
            major_dimension: Some("ROWS".to_string()),
            values: vec![values.to_vec()],
        };
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn update_row(&self, row_number: usize, values: &[String]) -> Result<(), SheetsError> {
        if row_number < super::FIRST_DATA_ROW {
            return Err(SheetsError::RowOutOfRange(row_number));
        }
        self.write_range(&self.row_range(row_number), values).await
    }
}
