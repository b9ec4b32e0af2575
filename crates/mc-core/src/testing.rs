//! In-memory doubles for the shell and the remote org.

use crate::error::{McError, Result};
use crate::remote::{
    Credentials, RemoteSession, ResourceRecord, RpcRequest, SessionInfo, StaticResource,
};
use crate::shell::{ShellRunner, ShellTask};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

type Hook = Box<dyn Fn(&ShellTask)>;

/// Records every task instead of running it. Can fail one task by its
/// display form, and can run a hook per task to fake tool side effects.
#[derive(Default)]
pub(crate) struct RecordingShell {
    pub tasks: RefCell<Vec<ShellTask>>,
    fail: Option<(String, i32)>,
    hook: Option<Hook>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(display: &str, exit_code: i32) -> Self {
        Self {
            fail: Some((display.to_string(), exit_code)),
            ..Self::default()
        }
    }

    pub fn with_hook(hook: impl Fn(&ShellTask) + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.tasks.borrow().iter().map(ShellTask::display).collect()
    }
}

impl ShellRunner for RecordingShell {
    fn run(&self, task: &ShellTask) -> Result<()> {
        self.tasks.borrow_mut().push(task.clone());
        if let Some((display, code)) = &self.fail {
            if *display == task.display() {
                return Err(McError::ToolFailed {
                    program: task.program.clone(),
                    exit_code: *code,
                });
            }
        }
        if let Some(hook) = &self.hook {
            hook(task);
        }
        Ok(())
    }
}

/// A fake org that stores static resources and pages by name.
pub(crate) struct StubSession {
    pub resources: RefCell<BTreeMap<String, (String, StaticResource)>>,
    pub pages: RefCell<BTreeMap<String, serde_json::Value>>,
    pub functions: RefCell<Vec<String>>,
    /// `packageVersion` answered to `versionInfo`.
    pub package_version: Option<String>,
    /// When set, returned verbatim for `versionInfo`.
    pub version_error: Option<serde_json::Value>,
    pub page_status: String,
    pub remote_calls: Cell<usize>,
    next_id: Cell<u32>,
}

impl StubSession {
    pub fn new(package_version: &str) -> Self {
        Self {
            resources: RefCell::default(),
            pages: RefCell::default(),
            functions: RefCell::default(),
            package_version: Some(package_version.to_string()),
            version_error: None,
            page_status: "success".to_string(),
            remote_calls: Cell::new(0),
            next_id: Cell::new(1),
        }
    }

    pub fn resource_count(&self, name: &str) -> usize {
        self.resources
            .borrow()
            .values()
            .filter(|(_, r)| r.name == name)
            .count()
    }

    fn tick(&self) {
        self.remote_calls.set(self.remote_calls.get() + 1);
    }
}

impl RemoteSession for StubSession {
    fn login(&mut self, creds: &Credentials) -> Result<SessionInfo> {
        Ok(SessionInfo {
            instance_url: "https://stub.my.salesforce.com".into(),
            access_token: format!("token-for-{}", creds.username),
            id: format!("https://{}/id/00D/005", creds.endpoint),
        })
    }

    fn post_rpc(&self, request: &RpcRequest) -> Result<serde_json::Value> {
        self.tick();
        let params = request.params()?;
        let function = params["function"].as_str().unwrap_or_default().to_string();
        self.functions.borrow_mut().push(function.clone());
        match function.as_str() {
            "versionInfo" => Ok(self
                .version_error
                .clone()
                .unwrap_or_else(|| json!({ "packageVersion": self.package_version }))),
            "createApexPage" => {
                let name = params["pageApiName"].as_str().unwrap_or_default().to_string();
                self.pages.borrow_mut().insert(name, params);
                Ok(json!({ "status": self.page_status }))
            }
            other => Ok(json!({ "errorNo": 1, "errorMessage": format!("unknown {other}") })),
        }
    }

    fn find_resource_by_name(&self, name: &str) -> Result<Option<ResourceRecord>> {
        self.tick();
        Ok(self
            .resources
            .borrow()
            .iter()
            .find(|(_, (_, r))| r.name == name)
            .map(|(id, _)| ResourceRecord {
                id: id.clone(),
                name: name.to_string(),
            }))
    }

    fn create_resource(&self, resource: &StaticResource) -> Result<String> {
        self.tick();
        let id = format!("081{:012}", self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.resources
            .borrow_mut()
            .insert(id.clone(), (resource.name.clone(), resource.clone()));
        Ok(id)
    }

    fn update_resource(&self, id: &str, resource: &StaticResource) -> Result<()> {
        self.tick();
        let mut resources = self.resources.borrow_mut();
        let Some(entry) = resources.get_mut(id) else {
            return Err(McError::UploadFailed {
                artifact: resource.name.clone(),
                detail: format!("no resource with id {id}"),
            });
        };
        entry.1 = resource.clone();
        Ok(())
    }
}
