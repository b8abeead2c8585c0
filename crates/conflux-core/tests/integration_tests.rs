//! End-to-end tests of the integration factory over the real adapters.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conflux_adapters::{InMemoryObjectStore, MiniJinjaEngine};
use conflux_core::{
    application::{
        ApplicationError, IntegrationFactory, IntegrationReader, ObjectStore, SinkWriter,
        WriterError, WriterRegistry, DEFAULT_SYSTEM_NAMESPACE,
    },
    domain::{
        keys, DomainError, ExpandedWriterData, IntegrationRequest, ObjectKind, PropertyMap,
        PropertyValue, Scope, Template,
    },
    error::{ConfluxError, ErrorCategory},
};

const CACHE_ENDPOINT: &str = r#"
[metadata]
name = "cache-endpoint"
alias = "Cache Endpoint"
description = "Address of a cache"
scope = "namespace"
sensitive = false

[template.parameter.host]
type = "string"
required = true

[template.parameter.port]
type = "integer"
default = 6379

[template.output]
type = "conflux.io/cache"

[template.output.labels]
team = "platform"

[template.output.data]
url = "{{ parameter.host }}:{{ parameter.port }}"
owner = "{{ context.name }}"

[template.validation]
result = "{{ parameter.port >= 1024 }}"
message = "{% if parameter.port < 1024 %}port {{ parameter.port }} is privileged{% endif %}"

[template.cache]
endpoint = { name = "cache-registry" }
format = "yaml"

[template.cache.content]
host = "{{ parameter.host }}"
port = "{{ parameter.port }}"

[template.cache.metadata]
key = "{{ context.namespace }}/{{ context.name }}"

[template.audit]
endpoint = "audit-log"
format = "properties"

[template.audit.content]
who = "{{ context.name }}"
"#;

const REGISTRY_SERVER: &str = r#"
[metadata]
name = "registry-server"
scope = "system"
sensitive = false

[template.parameter.url]
type = "string"
required = true

[template.output.data]
url = "{{ parameter.url }}"
"#;

/// A system-scoped cache address without sinks.
const SYSTEM_CACHE: &str = r#"
[metadata]
name = "cache-endpoint"
scope = "system"
sensitive = false

[template.parameter.host]
type = "string"
required = true

[template.parameter.port]
type = "integer"
default = 6379

[template.output.data]
url = "{{ parameter.host }}:{{ parameter.port }}"
"#;

/// The object type follows a parameter.
const TYPED_SECRET: &str = r#"
[metadata]
name = "typed-secret"
scope = "namespace"
sensitive = false

[template.parameter.flavor]
type = "string"
required = true

[template.output]
type = "conflux.io/{{ parameter.flavor }}"
"#;

// ============================================================================
// Writers
// ============================================================================

/// Records every payload together with the endpoint properties it resolved.
#[derive(Clone, Default)]
struct RecordingWriter {
    writes: Arc<Mutex<Vec<(ExpandedWriterData, PropertyMap)>>>,
}

#[async_trait]
impl SinkWriter for RecordingWriter {
    fn kind(&self) -> &'static str {
        "cache"
    }

    async fn write(
        &self,
        payload: &ExpandedWriterData,
        reader: &dyn IntegrationReader,
    ) -> Result<(), WriterError> {
        let endpoint = reader
            .resolve_integration(reader.system_namespace(), &payload.config.endpoint)
            .await
            .unwrap_or_default();
        self.writes
            .lock()
            .unwrap()
            .push((payload.clone(), endpoint));
        Ok(())
    }
}

/// Writer of the `audit` sink.
struct AuditWriter {
    reject: bool,
}

#[async_trait]
impl SinkWriter for AuditWriter {
    fn kind(&self) -> &'static str {
        "audit"
    }

    async fn write(
        &self,
        _payload: &ExpandedWriterData,
        _reader: &dyn IntegrationReader,
    ) -> Result<(), WriterError> {
        if self.reject {
            Err(WriterError::Rejected("audit log is read-only".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Audit {
    Accept,
    Reject,
    Unregistered,
}

struct Fixture {
    factory: IntegrationFactory,
    store: InMemoryObjectStore,
    recorder: RecordingWriter,
}

fn fixture(audit: Audit) -> Fixture {
    let store = InMemoryObjectStore::new();
    let recorder = RecordingWriter::default();
    let mut writers = WriterRegistry::new()
        .with(Arc::new(recorder.clone()))
        .unwrap();
    if audit != Audit::Unregistered {
        writers
            .register(Arc::new(AuditWriter {
                reject: audit == Audit::Reject,
            }))
            .unwrap();
    }
    let factory = IntegrationFactory::new(
        Box::new(store.clone()),
        Box::new(MiniJinjaEngine::new()),
        writers,
    );
    Fixture {
        factory,
        store,
        recorder,
    }
}

async fn install(factory: &IntegrationFactory, script: &str, namespace: &str) {
    let template = factory.parse_template("", script.as_bytes()).unwrap();
    factory.apply_template(namespace, &template).await.unwrap();
}

fn cache_request(name: &str) -> IntegrationRequest {
    IntegrationRequest::new(name, "team-a")
        .template("cache-endpoint", "default")
        .property("host", "redis.local")
}

async fn apply(fx: &Fixture, request: IntegrationRequest, namespace: &str) -> Result<(), ConfluxError> {
    let integration = fx.factory.parse_integration(request).await?;
    fx.factory.apply_integration(&integration, namespace).await
}

fn properties(json: &str) -> PropertyMap {
    serde_json::from_str(json).unwrap()
}

// ============================================================================
// Templates
// ============================================================================

#[tokio::test]
async fn template_round_trip() {
    let fx = fixture(Audit::Reject);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    let template = fx
        .factory
        .load_template("cache-endpoint", "default")
        .await
        .unwrap();
    assert_eq!(template.alias, "Cache Endpoint");
    assert_eq!(template.scope, Some(Scope::Namespace));
    assert!(template.schema.is_some());
    let sinks: Vec<&str> = template
        .expanded_writer
        .sinks
        .iter()
        .map(|s| s.sink.as_str())
        .collect();
    assert_eq!(sinks, vec!["audit", "cache"]);

    let listed = fx.factory.list_templates("default", None).await.unwrap();
    assert_eq!(listed.len(), 1);

    fx.factory
        .delete_template("default", "cache-endpoint")
        .await
        .unwrap();
    let err = fx
        .factory
        .load_template("cache-endpoint", "default")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::TemplateNotFound { .. })
    ));
}

#[tokio::test]
async fn templates_are_listed_by_scope() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;
    install(&fx.factory, REGISTRY_SERVER, "default").await;

    let names = |templates: Vec<Template>| -> Vec<String> {
        templates.into_iter().map(|t| t.name).collect()
    };
    let all = fx.factory.list_templates("default", None).await.unwrap();
    assert_eq!(all.len(), 2);
    let system = fx
        .factory
        .list_templates("default", Some(Scope::System))
        .await
        .unwrap();
    assert_eq!(names(system), vec!["registry-server"]);
    let namespaced = fx
        .factory
        .list_templates("default", Some(Scope::Namespace))
        .await
        .unwrap();
    assert_eq!(names(namespaced), vec!["cache-endpoint"]);
}

#[tokio::test]
async fn sinks_without_a_registered_writer_fail_at_apply() {
    let fx = fixture(Audit::Unregistered);
    let template = fx
        .factory
        .parse_template("", CACHE_ENDPOINT.as_bytes())
        .unwrap();
    let endpoints: Vec<(&str, &str)> = template
        .expanded_writer
        .sinks
        .iter()
        .map(|s| (s.sink.as_str(), s.endpoint.as_str()))
        .collect();
    assert_eq!(
        endpoints,
        vec![("audit", "audit-log"), ("cache", "cache-registry")]
    );
    fx.factory.apply_template("default", &template).await.unwrap();

    let err = apply(&fx, cache_request("orders-cache"), "team-a")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::UnknownSink { ref kind }) if kind == "audit"
    ));
    assert_eq!(fx.recorder.writes.lock().unwrap().len(), 1);
    assert!(fx
        .store
        .get(ObjectKind::Secret, "team-a", "orders-cache")
        .await
        .is_ok());
}

#[tokio::test]
async fn tables_without_an_endpoint_are_not_sinks() {
    let fx = fixture(Audit::Unregistered);
    let script = format!("{REGISTRY_SERVER}\n[template.notes]\ntext = \"kept out of the sinks\"\n");
    let template = fx.factory.parse_template("", script.as_bytes()).unwrap();
    assert!(template.expanded_writer.sinks.is_empty());
}

// ============================================================================
// Integrations
// ============================================================================

#[tokio::test]
async fn cache_endpoint_is_rendered_and_delivered() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;
    install(&fx.factory, REGISTRY_SERVER, "default").await;

    let registry = fx
        .factory
        .parse_integration(
            IntegrationRequest::new("cache-registry", "team-a")
                .template("registry-server", "default")
                .property("url", "http://registry:8080"),
        )
        .await
        .unwrap();
    fx.factory
        .apply_integration(&registry, "team-a")
        .await
        .unwrap();

    let integration = fx
        .factory
        .parse_integration(cache_request("orders-cache"))
        .await
        .unwrap();
    assert_eq!(integration.object.object_type, "conflux.io/cache");
    assert_eq!(integration.object.data["url"], "redis.local:6379");
    assert_eq!(integration.object.data["owner"], "orders-cache");
    assert_eq!(integration.object.labels["team"], "platform");
    assert_eq!(
        integration.object.label(keys::LABEL_TYPE),
        Some("cache-endpoint")
    );

    fx.factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap();

    let writes = fx.recorder.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    let (payload, endpoint) = &writes[0];
    assert_eq!(
        String::from_utf8(payload.content.clone()).unwrap(),
        "host: redis.local\nport: 6379\n"
    );
    assert_eq!(
        payload.metadata_str("key").as_deref(),
        Some("team-a/orders-cache")
    );
    assert_eq!(
        endpoint.get("url"),
        Some(&PropertyValue::from("http://registry:8080"))
    );
}

#[tokio::test]
async fn properties_round_trip_through_read_and_list() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    let integration = fx
        .factory
        .parse_integration(cache_request("orders-cache"))
        .await
        .unwrap();
    fx.factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap();

    let properties = fx
        .factory
        .read_integration("team-a", "orders-cache")
        .await
        .unwrap();
    assert_eq!(
        properties.get("host"),
        Some(&PropertyValue::from("redis.local"))
    );
    // Defaults are not written back into the stored input.
    assert_eq!(properties.get("port"), None);

    let listed = fx
        .factory
        .list_integrations("team-a", Some("cache-endpoint"), None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].template_name(), "cache-endpoint");
    assert!(listed[0].properties.is_some());

    let other = fx
        .factory
        .list_integrations("team-a", Some("registry-server"), None)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn sensitive_integrations_are_never_read_back() {
    let fx = fixture(Audit::Accept);
    let script = CACHE_ENDPOINT.replace("sensitive = false", "sensitive = true");
    install(&fx.factory, &script, "default").await;

    let integration = fx
        .factory
        .parse_integration(cache_request("secret-cache"))
        .await
        .unwrap();
    assert!(integration.is_sensitive());
    fx.factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap();

    let err = fx
        .factory
        .read_integration("team-a", "secret-cache")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::SensitiveIntegration { .. })
    ));

    let listed = fx.factory.list_integrations("team-a", None, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].properties.is_none());
    assert!(listed[0].object.data.is_empty());

    // The stored object still holds the rendered data.
    let stored = fx
        .store
        .get(ObjectKind::Secret, "team-a", "secret-cache")
        .await
        .unwrap();
    assert_eq!(stored.data["url"], "redis.local:6379");
}

#[tokio::test]
async fn partial_sink_failure_keeps_the_primary_object() {
    let fx = fixture(Audit::Reject);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    let integration = fx
        .factory
        .parse_integration(cache_request("orders-cache"))
        .await
        .unwrap();
    assert_eq!(integration.expanded_writer_data.len(), 2);

    let err = fx
        .factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::Sink { ref sink, .. }) if sink == "audit"
    ));

    // The failing sink comes first; the cache sink was still attempted.
    assert_eq!(fx.recorder.writes.lock().unwrap().len(), 1);
    assert!(fx
        .store
        .get(ObjectKind::Secret, "team-a", "orders-cache")
        .await
        .is_ok());
}

#[tokio::test]
async fn system_scoped_integrations_land_in_the_system_namespace() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, REGISTRY_SERVER, "default").await;

    let integration = fx
        .factory
        .parse_integration(
            IntegrationRequest::new("cache-registry", "team-a")
                .template("registry-server", "default")
                .property("url", "http://registry:8080"),
        )
        .await
        .unwrap();
    assert_eq!(integration.namespace, DEFAULT_SYSTEM_NAMESPACE);

    fx.factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap();
    assert!(fx
        .store
        .get(ObjectKind::Secret, "team-a", "cache-registry")
        .await
        .is_err());
    assert!(fx
        .factory
        .read_integration(DEFAULT_SYSTEM_NAMESPACE, "cache-registry")
        .await
        .is_ok());
}

#[tokio::test]
async fn invalid_properties_are_rejected_before_anything_is_stored() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    let err = fx
        .factory
        .parse_integration(
            IntegrationRequest::new("orders-cache", "team-a")
                .template("cache-endpoint", "default")
                .property("host", "redis.local")
                .property("port", "not-a-port"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Domain(DomainError::InvalidProperties { ref path, .. }) if path == "port"
    ));

    let missing = fx
        .factory
        .parse_integration(
            IntegrationRequest::new("orders-cache", "team-a").template("cache-endpoint", "default"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        missing,
        ConfluxError::Domain(DomainError::InvalidProperties { .. })
    ));
    // Only the template is stored.
    assert_eq!(fx.store.len(), 1);
}

#[tokio::test]
async fn unknown_names_report_not_found() {
    let fx = fixture(Audit::Accept);

    let err = fx
        .factory
        .parse_integration(cache_request("orders-cache"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = fx
        .factory
        .read_integration("team-a", "ghost")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::IntegrationNotFound { .. })
    ));

    let err = fx
        .factory
        .delete_integration("team-a", "ghost")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_removes_the_integration() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;
    let integration = fx
        .factory
        .parse_integration(cache_request("orders-cache"))
        .await
        .unwrap();
    fx.factory
        .apply_integration(&integration, "team-a")
        .await
        .unwrap();

    fx.factory
        .delete_integration("team-a", "orders-cache")
        .await
        .unwrap();
    assert!(fx
        .factory
        .list_integrations("team-a", None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn sensitive_endpoints_still_feed_the_sinks() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;
    let registry = REGISTRY_SERVER.replace("sensitive = false", "sensitive = true");
    install(&fx.factory, &registry, "default").await;

    apply(
        &fx,
        IntegrationRequest::new("cache-registry", "team-a")
            .template("registry-server", "default")
            .property("url", "http://registry:8080"),
        "team-a",
    )
    .await
    .unwrap();
    apply(&fx, cache_request("orders-cache"), "team-a")
        .await
        .unwrap();

    let writes = fx.recorder.writes.lock().unwrap();
    assert_eq!(
        writes[0].1.get("url"),
        Some(&PropertyValue::from("http://registry:8080"))
    );
    let err = fx
        .factory
        .read_integration(DEFAULT_SYSTEM_NAMESPACE, "cache-registry")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::SensitiveIntegration { .. })
    ));
}

#[tokio::test]
async fn system_cache_endpoint_reads_back_from_the_system_namespace() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, SYSTEM_CACHE, "default").await;
    let expected = properties(r#"{"host": "127.0.0.1", "port": 6379}"#);

    apply(
        &fx,
        IntegrationRequest::new("shared-cache", "default")
            .template("cache-endpoint", "default")
            .properties(expected.clone()),
        "default",
    )
    .await
    .unwrap();

    let read = fx
        .factory
        .read_integration(DEFAULT_SYSTEM_NAMESPACE, "shared-cache")
        .await
        .unwrap();
    assert_eq!(read, expected);
    let err = fx
        .factory
        .read_integration("default", "shared-cache")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::IntegrationNotFound { .. })
    ));
    assert!(fx.recorder.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sensitive_system_cache_endpoint_is_stored_but_never_read() {
    let fx = fixture(Audit::Accept);
    let script = SYSTEM_CACHE.replace("sensitive = false", "sensitive = true");
    install(&fx.factory, &script, "default").await;

    apply(
        &fx,
        IntegrationRequest::new("shared-cache", "default")
            .template("cache-endpoint", "default")
            .properties(properties(r#"{"host": "127.0.0.1", "port": 6379}"#)),
        "default",
    )
    .await
    .unwrap();

    let err = fx
        .factory
        .read_integration(DEFAULT_SYSTEM_NAMESPACE, "shared-cache")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::SensitiveIntegration { .. })
    ));
    let listed = fx
        .factory
        .list_integrations(DEFAULT_SYSTEM_NAMESPACE, None, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].properties.is_none());
    assert!(fx
        .factory
        .list_integrations("default", None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn integrations_are_listed_by_scope() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, SYSTEM_CACHE, "default").await;
    apply(
        &fx,
        IntegrationRequest::new("shared-cache", "default")
            .template("cache-endpoint", "default")
            .property("host", "127.0.0.1"),
        "default",
    )
    .await
    .unwrap();
    apply(
        &fx,
        IntegrationRequest::new("raw-settings", DEFAULT_SYSTEM_NAMESPACE).property("debug", true),
        DEFAULT_SYSTEM_NAMESPACE,
    )
    .await
    .unwrap();

    let all = fx
        .factory
        .list_integrations(DEFAULT_SYSTEM_NAMESPACE, None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let system = fx
        .factory
        .list_integrations(DEFAULT_SYSTEM_NAMESPACE, None, Some(Scope::System))
        .await
        .unwrap();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].name, "shared-cache");
}

#[tokio::test]
async fn template_validation_rejects_the_properties() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    let err = fx
        .factory
        .parse_integration(cache_request("orders-cache").property("port", 80))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Domain(DomainError::ValidationFailed(ref message)) if message == "port 80 is privileged"
    ));
    assert_eq!(
        err.to_string(),
        "failed to validate config: port 80 is privileged"
    );

    assert!(fx
        .factory
        .parse_integration(cache_request("orders-cache").property("port", 6380))
        .await
        .is_ok());
}

#[tokio::test]
async fn reapplying_keeps_the_template() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;
    install(&fx.factory, TYPED_SECRET, "default").await;

    apply(&fx, cache_request("orders-cache"), "team-a")
        .await
        .unwrap();
    // Same template and type: an update.
    apply(
        &fx,
        cache_request("orders-cache").property("host", "redis-2.local"),
        "team-a",
    )
    .await
    .unwrap();

    let err = apply(
        &fx,
        IntegrationRequest::new("orders-cache", "team-a")
            .template("typed-secret", "default")
            .property("flavor", "cache"),
        "team-a",
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::TemplateChanged { ref from, ref to, .. })
            if from == "cache-endpoint" && to == "typed-secret"
    ));

    let stored = fx
        .store
        .get(ObjectKind::Secret, "team-a", "orders-cache")
        .await
        .unwrap();
    assert_eq!(stored.data["url"], "redis-2.local:6379");
}

#[tokio::test]
async fn reapplying_keeps_the_object_type() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, TYPED_SECRET, "default").await;
    let request = |flavor: &str| {
        IntegrationRequest::new("db-password", "team-a")
            .template("typed-secret", "default")
            .property("flavor", flavor)
    };

    apply(&fx, request("basic-auth"), "team-a").await.unwrap();
    let err = apply(&fx, request("tls"), "team-a").await.unwrap_err();
    assert!(matches!(
        err,
        ConfluxError::Application(ApplicationError::TypeChanged { ref from, ref to, .. })
            if from == "conflux.io/basic-auth" && to == "conflux.io/tls"
    ));
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn alias_and_description_are_kept_on_the_object() {
    let fx = fixture(Audit::Accept);
    install(&fx.factory, CACHE_ENDPOINT, "default").await;

    apply(
        &fx,
        cache_request("orders-cache")
            .alias("Orders cache")
            .description("Cache of the orders service"),
        "team-a",
    )
    .await
    .unwrap();
    apply(
        &fx,
        IntegrationRequest::new("raw-settings", "team-a")
            .property("debug", true)
            .alias("Raw settings"),
        "team-a",
    )
    .await
    .unwrap();

    let stored = fx
        .store
        .get(ObjectKind::Secret, "team-a", "orders-cache")
        .await
        .unwrap();
    assert_eq!(stored.annotation(keys::ANNOTATION_ALIAS), Some("Orders cache"));
    assert_eq!(
        stored.annotation(keys::ANNOTATION_DESCRIPTION),
        Some("Cache of the orders service")
    );

    let listed = fx
        .factory
        .list_integrations("team-a", None, None)
        .await
        .unwrap();
    let aliases: Vec<(&str, &str)> = listed
        .iter()
        .map(|i| (i.name.as_str(), i.alias.as_str()))
        .collect();
    assert!(aliases.contains(&("orders-cache", "Orders cache")));
    assert!(aliases.contains(&("raw-settings", "Raw settings")));
}
