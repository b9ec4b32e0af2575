use crate::error::PlatformError;
use crate::soap;
use mc_core::remote::{
    self, Credentials, RemoteSession, ResourceRecord, RpcRequest, SessionInfo, StaticResource,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

/// A REST session against one org instance.
pub struct HttpSession {
    client: Client,
    api_version: u32,
    info: Option<SessionInfo>,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    records: Vec<QueryRecord>,
}

#[derive(Deserialize)]
struct QueryRecord {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Deserialize)]
struct CreateResult {
    id: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

impl HttpSession {
    pub fn new(api_version: u32) -> Self {
        Self {
            client: Client::new(),
            api_version,
            info: None,
        }
    }

    /// A session from a cached access token, without logging in.
    pub fn from_token(info: SessionInfo, api_version: u32) -> Self {
        Self {
            info: Some(info),
            ..Self::new(api_version)
        }
    }

    fn session(&self) -> Result<&SessionInfo, PlatformError> {
        self.info.as_ref().ok_or(PlatformError::NotLoggedIn)
    }

    fn url(&self, path: &str) -> Result<String, PlatformError> {
        let base = self.session()?.instance_url.trim_end_matches('/');
        Ok(format!("{base}{path}"))
    }

    fn tooling(&self, path: &str) -> Result<String, PlatformError> {
        self.url(&format!(
            "/services/data/v{}.0/tooling{path}",
            self.api_version
        ))
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, PlatformError> {
        Ok(builder.bearer_auth(&self.session()?.access_token))
    }

    fn send(
        &self,
        method: &'static str,
        url: String,
        builder: RequestBuilder,
    ) -> Result<Response, PlatformError> {
        tracing::debug!(method, %url, "request");
        let resp = self.authorized(builder)?.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(PlatformError::Api {
                method,
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    fn rpc(&self, request: &RpcRequest) -> Result<serde_json::Value, PlatformError> {
        let url = self.url(&format!("/services/apexrest{}", remote::RPC_PATH))?;
        let resp = self.send("POST", url.clone(), self.client.post(&url).json(request))?;
        let body = resp.text()?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(remote::decode_rpc_body(value))
    }

    fn query_resource(&self, name: &str) -> Result<Option<ResourceRecord>, PlatformError> {
        let soql = format!(
            "SELECT Id, Name FROM StaticResource WHERE Name = '{}'",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let url = self.tooling("/query/")?;
        let resp = self.send("GET", url.clone(), self.client.get(&url).query(&[("q", soql)]))?;
        let result: QueryResult = resp.json()?;
        Ok(result.records.into_iter().next().map(|r| ResourceRecord {
            id: r.id,
            name: r.name,
        }))
    }

    fn insert_resource(&self, resource: &StaticResource) -> Result<String, PlatformError> {
        let url = self.tooling("/sobjects/StaticResource/")?;
        let resp = self.send("POST", url.clone(), self.client.post(&url).json(resource))?;
        let result: CreateResult = resp.json()?;
        if !result.success {
            return Err(PlatformError::Response(format!(
                "create of {} failed: {}",
                resource.name,
                serde_json::Value::Array(result.errors)
            )));
        }
        Ok(result.id)
    }

    fn patch_resource(&self, id: &str, resource: &StaticResource) -> Result<(), PlatformError> {
        let url = self.tooling(&format!("/sobjects/StaticResource/{id}"))?;
        let body = json!({
            "Body": resource.body,
            "ContentType": resource.content_type,
            "CacheControl": resource.cache_control,
        });
        self.send("PATCH", url.clone(), self.client.patch(&url).json(&body))?;
        Ok(())
    }
}

impl RemoteSession for HttpSession {
    fn login(&mut self, creds: &Credentials) -> mc_core::Result<SessionInfo> {
        let info = soap::login(&self.client, creds, self.api_version)?;
        self.info = Some(info.clone());
        Ok(info)
    }

    fn post_rpc(&self, request: &RpcRequest) -> mc_core::Result<serde_json::Value> {
        Ok(self.rpc(request)?)
    }

    fn find_resource_by_name(&self, name: &str) -> mc_core::Result<Option<ResourceRecord>> {
        Ok(self.query_resource(name)?)
    }

    fn create_resource(&self, resource: &StaticResource) -> mc_core::Result<String> {
        Ok(self.insert_resource(resource)?)
    }

    fn update_resource(&self, id: &str, resource: &StaticResource) -> mc_core::Result<()> {
        Ok(self.patch_resource(id, resource)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn session(server: &mockito::Server) -> HttpSession {
        HttpSession::from_token(
            SessionInfo {
                instance_url: server.url(),
                access_token: "tok".into(),
                id: String::new(),
            },
            41,
        )
    }

    fn resource() -> StaticResource {
        StaticResource::zip("MyApp_001", "bundle", "UEsDBA==".into())
    }

    #[test]
    fn rpc_accepts_string_wrapped_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/services/apexrest/mobilecaddy1/PlatformDevUtilsR001/")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(json!({
                "startPageControllerVersion": "001",
                "jsonParams": "{\"function\":\"versionInfo\"}"
            })))
            .with_status(200)
            .with_body(r#""{\"packageVersion\":\"1.2.0\"}""#)
            .create();

        let req = RpcRequest::new("001", &json!({"function": "versionInfo"})).unwrap();
        let value = session(&server).post_rpc(&req).unwrap();
        mock.assert();
        assert_eq!(value["packageVersion"], "1.2.0");
    }

    #[test]
    fn rpc_accepts_plain_json() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/services/apexrest/mobilecaddy1/PlatformDevUtilsR001/")
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create();
        let req = RpcRequest::new("001", &json!({"function": "createApexPage"})).unwrap();
        let value = session(&server).post_rpc(&req).unwrap();
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn find_by_name_queries_tooling_api() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/services/data/v41.0/tooling/query/")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "SELECT Id, Name FROM StaticResource WHERE Name = 'MyApp_001'".into(),
            ))
            .with_status(200)
            .with_body(r#"{"size":1,"records":[{"Id":"081000000000001","Name":"MyApp_001"}]}"#)
            .create();
        server
            .mock("GET", "/services/data/v41.0/tooling/query/")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "SELECT Id, Name FROM StaticResource WHERE Name = 'Other'".into(),
            ))
            .with_status(200)
            .with_body(r#"{"size":0,"records":[]}"#)
            .create();

        let s = session(&server);
        let found = s.find_resource_by_name("MyApp_001").unwrap().unwrap();
        assert_eq!(found.id, "081000000000001");
        assert!(s.find_resource_by_name("Other").unwrap().is_none());
    }

    #[test]
    fn create_posts_resource_fields() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/services/data/v41.0/tooling/sobjects/StaticResource/")
            .match_body(Matcher::PartialJson(json!({
                "Name": "MyApp_001",
                "ContentType": "application/zip",
                "CacheControl": "Public",
                "Body": "UEsDBA=="
            })))
            .with_status(201)
            .with_body(r#"{"id":"081000000000002","success":true,"errors":[]}"#)
            .create();
        let id = session(&server).create_resource(&resource()).unwrap();
        mock.assert();
        assert_eq!(id, "081000000000002");
    }

    #[test]
    fn update_patches_by_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PATCH", "/services/data/v41.0/tooling/sobjects/StaticResource/081X")
            .with_status(204)
            .create();
        session(&server).update_resource("081X", &resource()).unwrap();
        mock.assert();
    }

    #[test]
    fn http_errors_surface_as_network_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/services/data/v41.0/tooling/sobjects/StaticResource/")
            .with_status(400)
            .with_body(r#"[{"errorCode":"INVALID_FIELD"}]"#)
            .create();
        let err = session(&server).create_resource(&resource()).unwrap_err();
        assert!(matches!(err, mc_core::McError::Network(_)));
        assert!(err.to_string().contains("INVALID_FIELD"));
    }

    #[test]
    fn expired_token_is_login_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Any)
            .with_status(401)
            .create();
        let err = session(&server).find_resource_by_name("x").unwrap_err();
        assert!(matches!(err, mc_core::McError::LoginFailed(_)));
    }

    #[test]
    fn calls_without_login_fail() {
        let s = HttpSession::new(41);
        let req = RpcRequest::new("001", &json!({})).unwrap();
        assert!(matches!(
            s.post_rpc(&req),
            Err(mc_core::McError::LoginFailed(_))
        ));
    }
}
