//! Generic document API: list, count, get, insert, update, delete, RPC, upload.
//!
//! Every call goes through [`DeskClient::send`], so all of them get the
//! stale-token refresh. Non-OK responses become [`DeskError::Api`] with an
//! operation-specific fallback message.

use desk_types::{Doctype, Filters, ListQuery};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::{DeskClient, DeskError, FilePart, MultipartBody, RequestBody};

const GET_LIST: &str = "frappe.client.get_list";
const GET_COUNT: &str = "frappe.client.get_count";
const INSERT: &str = "frappe.client.insert";
const SET_VALUE: &str = "frappe.client.set_value";
const DELETE: &str = "frappe.client.delete";
const UPLOAD_FILE: &str = "upload_file";

impl DeskClient {
    /// One page of rows for `query`.
    pub async fn list<T: DeserializeOwned>(&self, query: &ListQuery) -> Result<Vec<T>, DeskError> {
        let url = self.method_url(GET_LIST, &query.list_params())?;
        self.send(Method::GET, url, &RequestBody::Empty)
            .await?
            .error_for_status(&format!("Failed to load {}", query.doctype()))?
            .message(GET_LIST)
    }

    /// Number of documents matching both filter sets.
    pub async fn count(
        &self,
        doctype: &Doctype,
        filters: &Filters,
        or_filters: &Filters,
    ) -> Result<u64, DeskError> {
        let query = [
            ("doctype", doctype.as_str().to_string()),
            ("filters", filters.to_json()),
            ("or_filters", or_filters.to_json()),
        ];
        self.count_with(doctype, &query).await
    }

    pub(crate) async fn count_with(
        &self,
        doctype: &Doctype,
        query: &[(&str, String)],
    ) -> Result<u64, DeskError> {
        let url = self.method_url(GET_COUNT, query)?;
        self.send(Method::GET, url, &RequestBody::Empty)
            .await?
            .error_for_status(&format!("Failed to count {doctype}"))?
            .message(GET_COUNT)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        name: &str,
    ) -> Result<T, DeskError> {
        let url = self.resource_url(doctype.as_str(), Some(name))?;
        self.send(Method::GET, url, &RequestBody::Empty)
            .await?
            .error_for_status(&format!("Failed to load {doctype} {name}"))?
            .data("document")
    }

    /// Create a document. `doc` must be a JSON object; its `doctype` key is set.
    pub async fn insert<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        doc: Value,
    ) -> Result<T, DeskError> {
        let Value::Object(mut fields) = doc else {
            return Err(DeskError::InvalidArgument(
                "document must be a JSON object".to_string(),
            ));
        };
        fields.insert("doctype".to_string(), Value::String(doctype.to_string()));

        let url = self.method_url(INSERT, &[])?;
        let body = RequestBody::Json(json!({ "doc": fields }));
        self.send(Method::POST, url, &body)
            .await?
            .error_for_status(&format!("Failed to create {doctype}"))?
            .message(INSERT)
    }

    pub async fn set_value<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        name: &str,
        fieldname: &str,
        value: Value,
    ) -> Result<T, DeskError> {
        if fieldname.trim().is_empty() {
            return Err(DeskError::InvalidArgument(
                "field name must not be empty".to_string(),
            ));
        }
        self.update(doctype, name, json!(fieldname), Some(value)).await
    }

    /// Update several fields in one call.
    pub async fn set_values<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        name: &str,
        values: Map<String, Value>,
    ) -> Result<T, DeskError> {
        if values.is_empty() {
            return Err(DeskError::InvalidArgument(
                "no fields to update".to_string(),
            ));
        }
        self.update(doctype, name, Value::Object(values), None).await
    }

    async fn update<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        name: &str,
        fieldname: Value,
        value: Option<Value>,
    ) -> Result<T, DeskError> {
        require_name(name)?;
        let mut args = json!({
            "doctype": doctype.as_str(),
            "name": name,
            "fieldname": fieldname,
        });
        if let Some(value) = value {
            args["value"] = value;
        }

        let url = self.method_url(SET_VALUE, &[])?;
        self.send(Method::POST, url, &RequestBody::Json(args))
            .await?
            .error_for_status(&format!("Failed to update {doctype} {name}"))?
            .message(SET_VALUE)
    }

    pub async fn delete(&self, doctype: &Doctype, name: &str) -> Result<(), DeskError> {
        require_name(name)?;
        let url = self.method_url(DELETE, &[])?;
        let body = RequestBody::Json(json!({ "doctype": doctype.as_str(), "name": name }));
        self.send(Method::POST, url, &body)
            .await?
            .error_for_status(&format!("Failed to delete {doctype} {name}"))?;
        Ok(())
    }

    /// POST to an arbitrary whitelisted method; returns the `message` payload.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Value,
    ) -> Result<T, DeskError> {
        let url = self.method_url(method, &[])?;
        let body = match args {
            Value::Null => RequestBody::Empty,
            args => RequestBody::Json(args),
        };
        self.send(Method::POST, url, &body)
            .await?
            .error_for_status(&format!("Failed to call {method}"))?
            .message(method)
    }

    /// GET variant of [`call`](Self::call) for read-only methods.
    pub async fn call_get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, DeskError> {
        let url = self.method_url(method, query)?;
        self.send(Method::GET, url, &RequestBody::Empty)
            .await?
            .error_for_status(&format!("Failed to call {method}"))?
            .message(method)
    }

    /// POST to a method under the configured RPC namespace.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: Value,
    ) -> Result<T, DeskError> {
        self.call(&self.rpc_method(function), args).await
    }

    pub async fn rpc_get<T: DeserializeOwned>(
        &self,
        function: &str,
        query: &[(&str, String)],
    ) -> Result<T, DeskError> {
        self.call_get(&self.rpc_method(function), query).await
    }

    /// Attach a file to a document.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        doctype: &Doctype,
        name: &str,
        file: FilePart,
        is_private: bool,
    ) -> Result<T, DeskError> {
        require_name(name)?;
        let form = MultipartBody::new()
            .text("doctype", doctype.as_str())
            .text("docname", name)
            .text("is_private", if is_private { "1" } else { "0" })
            .file(file);

        let url = self.method_url(UPLOAD_FILE, &[])?;
        self.send(Method::POST, url, &RequestBody::Multipart(form))
            .await?
            .error_for_status("Failed to upload file")?
            .message(UPLOAD_FILE)
    }
}

fn require_name(name: &str) -> Result<(), DeskError> {
    if name.trim().is_empty() {
        return Err(DeskError::InvalidArgument(
            "document name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client_with_token;
    use desk_types::{Filter, Page};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn lead() -> Doctype {
        Doctype::from_static("Lead")
    }

    #[tokio::test]
    async fn list_sends_query_and_unwraps_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/method/frappe.client.get_list"))
            .and(query_param("doctype", "Lead"))
            .and(query_param("fields", r#"["name","lead_name"]"#))
            .and(query_param("filters", r#"[["status","=","Open"]]"#))
            .and(query_param("or_filters", "[]"))
            .and(query_param("limit_start", "20"))
            .and(query_param("limit_page_length", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": [{"name": "CRM-LEAD-0001", "lead_name": "Acme"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let query = ListQuery::new(lead())
            .with_fields(["name", "lead_name"])
            .with_filters(Filters::new().with(Filter::eq("status", "Open")))
            .with_page(Page::new(2, 20).unwrap());
        let rows: Vec<Value> = client.list(&query).await.unwrap();
        assert_eq!(rows[0]["lead_name"], "Acme");
    }

    #[tokio::test]
    async fn count_sends_both_filter_sets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/method/frappe.client.get_count"))
            .and(query_param("filters", "[]"))
            .and(query_param("or_filters", r#"[["email","like","%acme%"]]"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": 42})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let total = client
            .count(&lead(), &Filters::new(), &Filters::search(&["email"], "acme"))
            .await
            .unwrap();
        assert_eq!(total, 42);
    }

    #[tokio::test]
    async fn get_reads_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Sales%20Invoice/ACC-SINV-0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"name": "ACC-SINV-0001", "grand_total": 120.5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let doc: Value = client
            .get(&Doctype::from_static("Sales Invoice"), "ACC-SINV-0001")
            .await
            .unwrap();
        assert_eq!(doc["grand_total"], 120.5);
    }

    #[tokio::test]
    async fn insert_wraps_doc_and_sets_doctype() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.insert"))
            .and(body_json(json!({
                "doc": {"doctype": "Lead", "lead_name": "Acme"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"name": "CRM-LEAD-0002", "lead_name": "Acme"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let doc: Value = client
            .insert(&lead(), json!({"lead_name": "Acme", "doctype": "Ignored"}))
            .await
            .unwrap();
        assert_eq!(doc["name"], "CRM-LEAD-0002");
    }

    #[tokio::test]
    async fn insert_rejects_non_objects() {
        let client = client_with_token("http://127.0.0.1:9", "tok");
        let err = client.insert::<Value>(&lead(), json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, DeskError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn set_value_and_set_values_shapes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.set_value"))
            .and(body_json(json!({
                "doctype": "Lead",
                "name": "CRM-LEAD-0001",
                "fieldname": "status",
                "value": "Converted",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": {"status": "Converted"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.set_value"))
            .and(body_json(json!({
                "doctype": "Lead",
                "name": "CRM-LEAD-0001",
                "fieldname": {"status": "Open", "source": "Web"},
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": {"status": "Open"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let single: Value = client
            .set_value(&lead(), "CRM-LEAD-0001", "status", json!("Converted"))
            .await
            .unwrap();
        assert_eq!(single["status"], "Converted");

        let mut values = Map::new();
        values.insert("status".to_string(), json!("Open"));
        values.insert("source".to_string(), json!("Web"));
        let many: Value = client.set_values(&lead(), "CRM-LEAD-0001", values).await.unwrap();
        assert_eq!(many["status"], "Open");
    }

    #[tokio::test]
    async fn delete_surfaces_server_message() {
        let server = MockServer::start().await;
        let inner = json!({"message": "Cannot delete a linked document"}).to_string();
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.delete"))
            .respond_with(ResponseTemplate::new(417).set_body_json(json!({
                "exc_type": "LinkExistsError",
                "_server_messages": serde_json::to_string(&vec![inner]).unwrap(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let err = client.delete(&lead(), "CRM-LEAD-0001").await.unwrap_err();
        assert_eq!(err.user_message(), "Cannot delete a linked document");
        assert_eq!(err.status().map(|s| s.as_u16()), Some(417));
    }

    #[tokio::test]
    async fn rpc_uses_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frontend_api.leads.convert_to_deal"))
            .and(body_json(json!({"lead": "CRM-LEAD-0001"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "CRM-OPP-0001"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let deal: String = client
            .rpc("leads.convert_to_deal", json!({"lead": "CRM-LEAD-0001"}))
            .await
            .unwrap();
        assert_eq!(deal, "CRM-OPP-0001");
    }

    #[tokio::test]
    async fn upload_file_sends_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/upload_file"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body);
                assert!(body.contains("name=\"doctype\"\r\n\r\nExpense Claim"));
                assert!(body.contains("name=\"docname\"\r\n\r\nHR-EXP-0001"));
                assert!(body.contains("name=\"is_private\"\r\n\r\n1"));
                assert!(body.contains("filename=\"receipt.pdf\""));
                ResponseTemplate::new(200).set_body_json(json!({
                    "message": {"file_url": "/private/files/receipt.pdf"}
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server.uri(), "tok");
        let file: Value = client
            .upload_file(
                &Doctype::from_static("Expense Claim"),
                "HR-EXP-0001",
                FilePart::new("receipt.pdf", b"%PDF-1.4".to_vec()).with_mime("application/pdf"),
                true,
            )
            .await
            .unwrap();
        assert_eq!(file["file_url"], "/private/files/receipt.pdf");
    }

    #[tokio::test]
    async fn blank_names_fail_before_any_request() {
        let client = client_with_token("http://127.0.0.1:9", "tok");
        assert!(client.delete(&lead(), " ").await.is_err());
        assert!(
            client
                .set_values::<Value>(&lead(), "CRM-LEAD-0001", Map::new())
                .await
                .is_err()
        );
    }
}
