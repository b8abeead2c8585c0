//! Templates shipped with Conflux.
//!
//! - `nacos-server`: system-scoped connection settings of a Nacos config
//!   service, used as the endpoint of the `nacos` sink
//! - `nacos-config`: a configuration document published to that endpoint
//!
//! Both are plain template scripts; they go through the same parser as user
//! templates.

/// A template script embedded in the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinScript {
    pub name: &'static str,
    pub script: &'static str,
}

pub const NACOS_SERVER: BuiltinScript = BuiltinScript {
    name: "nacos-server",
    script: r#"[metadata]
name = "nacos-server"
alias = "Nacos Server"
description = "Connection settings of a Nacos config service"
scope = "system"
sensitive = true

[template.parameter.servers]
type = "array"
required = true
description = "Addresses of the Nacos servers; the first one is used"

[template.parameter.servers.items]
type = "object"

[template.parameter.servers.items.properties]
ipAddr = { type = "string", required = true }
port = { type = "integer", required = true }
scheme = { type = "string", enum = ["http", "https"] }
contextPath = { type = "string" }

[template.parameter.client]
type = "object"
description = "Client settings"

[template.parameter.client.properties]
namespaceId = { type = "string", description = "Default tenant of published configs" }
username = { type = "string" }
password = { type = "string" }
timeoutMs = { type = "integer" }
"#,
};

pub const NACOS_CONFIG: BuiltinScript = BuiltinScript {
    name: "nacos-config",
    script: r#"[metadata]
name = "nacos-config"
alias = "Nacos Configuration"
description = "A configuration document published to a Nacos server"
scope = "namespace"
sensitive = false

[template.parameter.dataId]
type = "string"
required = true
description = "Data id of the config"

[template.parameter.group]
type = "string"
default = "DEFAULT_GROUP"

[template.parameter.appName]
type = "string"
default = ""

[template.parameter.namespaceId]
type = "string"
description = "Overrides the tenant of the endpoint"

[template.parameter.content]
type = "object"
required = true
description = "The configuration document"

[template.nacos]
endpoint = { name = "nacos-server" }
format = "json"
content = "{{ parameter.content }}"

[template.nacos.metadata]
dataId = "{{ parameter.dataId }}"
group = "{{ parameter.group }}"
appName = "{{ parameter.appName }}"
namespaceId = "{{ parameter.namespaceId | default('') }}"
"#,
};

/// Every built-in template script.
pub fn all_scripts() -> [BuiltinScript; 2] {
    [NACOS_SERVER, NACOS_CONFIG]
}

/// Look a built-in script up by template name.
pub fn find(name: &str) -> Option<BuiltinScript> {
    all_scripts().into_iter().find(|s| s.name == name)
}
