//! End-to-end behaviour of the container: registration, provider
//! configuration, synchronous and asynchronous resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use dizzy_core::{
    injectable, Constructor, Container, ContainerConfig, CoreError, Function, Key,
    StaticModuleLoader, Value,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn text(value: &Value) -> &str {
    value.get::<String>().unwrap()
}

fn shout() -> Function {
    Function::from_source("(greeting) => greeting.toUpperCase()", |args| {
        Ok(Value::new(args.get::<String>(0)?.to_uppercase()))
    })
}

/// Factory that returns a higher number on every invocation
fn counter() -> (Function, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let function = Function::new(move |_| Ok(Value::new(seen.fetch_add(1, Ordering::SeqCst) + 1)));
    (function, calls)
}

#[test]
fn test_greeting_scenario() {
    init_tracing();
    let container = Container::new();

    container.register("greeting", Value::new("hi".to_string()));
    assert_eq!(text(&container.resolve("greeting").unwrap()), "hi");

    container.register("shout", shout()).as_factory().cached();
    assert_eq!(text(&container.resolve("shout").unwrap()), "HI");

    container.register("greeting", Value::new("hello".to_string()));
    assert_eq!(text(&container.resolve("shout").unwrap()), "HI");

    container.provider("shout").unwrap().reset_cache();
    assert_eq!(text(&container.resolve("shout").unwrap()), "HELLO");
}

#[tokio::test]
async fn test_default_configuration_round_trips() {
    let container = Container::new();
    let stored = Value::new(vec![1, 2, 3]);
    let provider = container.register("numbers", stored.clone());

    assert!(Value::ptr_eq(&provider.provide().unwrap(), &stored));
    assert!(Value::ptr_eq(&container.resolve("numbers").unwrap(), &stored));
    assert!(Value::ptr_eq(
        &container.resolve_async("numbers").await.unwrap(),
        &stored
    ));
}

#[tokio::test]
async fn test_missing_key() {
    let container = Container::new();

    let error = container.resolve("missing-key").unwrap_err();
    assert!(error.is_invalid_key());
    assert!(error.to_string().contains("missing-key"));

    let error = container.resolve_async("missing-key").await.unwrap_err();
    assert!(error.to_string().contains("missing-key"));
}

#[tokio::test]
async fn test_factory_of_non_function() {
    let container = Container::new();
    container
        .register("broken", Value::new("not a function"))
        .as_factory();

    let error = container.resolve("broken").unwrap_err();
    assert!(error.is_not_callable());
    assert!(error.to_string().contains("did not resolve to a function"));
    assert!(error.to_string().contains("broken"));

    let error = container.resolve_async("broken").await.unwrap_err();
    assert!(error.is_not_callable());
}

#[test]
fn test_caching_controls_recomputation() {
    let container = Container::new();
    let (function, calls) = counter();
    let provider = container.register("counter", function);
    provider.as_factory();

    let first = *container.resolve("counter").unwrap().get::<usize>().unwrap();
    let second = *container.resolve("counter").unwrap().get::<usize>().unwrap();
    assert_ne!(first, second);

    provider.cached();
    let first = container.resolve("counter").unwrap();
    let second = container.resolve("counter").unwrap();
    assert!(Value::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_call_and_call_async() {
    let container = Container::new();
    container.register("a", Value::new(1_i64));
    container.register("b", Value::new(2_i64));

    let add = Function::from_source("function add(a, b) { return a + b; }", |args| {
        Ok(Value::new(args.get::<i64>(0)? + args.get::<i64>(1)?))
    });
    assert_eq!(container.call(&add, None, None).unwrap().get::<i64>().unwrap(), &3);

    container.register("b", Value::deferred(async { Ok(Value::new(2_i64)) }));
    let value = container.call_async(&add, None, None).await.unwrap();
    assert_eq!(value.get::<i64>().unwrap(), &3);
}

#[test]
fn test_factory_dependencies_are_inferred_in_order() {
    let container = Container::new();
    container.register("first", Value::new("1".to_string()));
    container.register("second", Value::new("2".to_string()));
    container
        .register(
            "joined",
            Function::from_source("(second, first) => ...", |args| {
                Ok(Value::new(format!(
                    "{}{}",
                    args.get::<String>(0)?,
                    args.get::<String>(1)?
                )))
            }),
        )
        .as_factory();

    assert_eq!(text(&container.resolve("joined").unwrap()), "21");

    container.provider("joined").unwrap().as_factory_with(["first", "first"]);
    assert_eq!(text(&container.resolve("joined").unwrap()), "11");
}

#[derive(Debug)]
struct Server {
    host: String,
    port: Option<u16>,
}

fn server() -> Constructor {
    Constructor::from_source::<Server, _>(
        "class Server { constructor(host, port) { this.host = host; } }",
        |args| {
            Ok(Server {
                host: args.get::<String>(0)?.clone(),
                port: args.value(1).and_then(|port| port.downcast_ref::<u16>().copied()),
            })
        },
    )
}

#[tokio::test]
async fn test_instance_providers() {
    let container = Container::new();
    container.register("host", Value::new("localhost".to_string()));
    container.register("port", Value::deferred(async { Ok(Value::new(8080_u16)) }));
    container.register("server", server()).as_instance().cached();

    let value = container.resolve_async("server").await.unwrap();
    let built = value.get::<Server>().unwrap();
    assert_eq!(built.host, "localhost");
    assert_eq!(built.port, Some(8080));

    // Cached by the asynchronous path, visible to the synchronous one
    assert!(Value::ptr_eq(&container.resolve("server").unwrap(), &value));
}

#[test]
fn test_short_override_injects_nothing_for_trailing_parameters() {
    let container = Container::new();
    container.register("host", Value::new("example.org".to_string()));
    container.register("port", Value::new(443_u16));

    let value = container
        .instance(&server(), Some(&Key::list(["host"])))
        .unwrap();
    let built = value.get::<Server>().unwrap();
    assert_eq!(built.host, "example.org");
    assert_eq!(built.port, None);
}

#[tokio::test]
async fn test_sync_resolution_during_pending_async_resolution() {
    let container = Container::new();
    let (sender, receiver) = tokio::sync::oneshot::channel::<u32>();
    container
        .register(
            "slow",
            Value::deferred(async move {
                let number = receiver.await.map_err(|e| CoreError::factory(e.to_string()))?;
                Ok(Value::new(number))
            }),
        )
        .cached();

    let pending = container.resolve_async("slow");
    futures::pin_mut!(pending);
    assert!(futures::poll!(&mut pending).is_pending());

    let error = container.resolve("slow").unwrap_err();
    assert!(error.is_concurrent_access());

    sender.send(7).unwrap();
    let settled = pending.await.unwrap();
    assert_eq!(settled.get::<u32>().unwrap(), &7);

    let cached = container.resolve("slow").unwrap();
    assert!(Value::ptr_eq(&cached, &settled));
}

#[test]
fn test_from_container_aliases() {
    let container = Container::new();
    container.register("database", Value::new("postgres".to_string()));
    container.register("db", Value::new("database")).from_container();
    container.register("storage", Value::new(Key::from("db"))).from_container();

    assert_eq!(text(&container.resolve("storage").unwrap()), "postgres");
}

#[test]
fn test_from_module_reads_relative_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.json"), r#"{"name": "dizzy"}"#).unwrap();

    let container = Container::with_config(ContainerConfig::new().with_base_directory(dir.path()));
    container
        .register("settings", Value::new("./settings.json"))
        .from_module()
        .cached();

    let value = container.resolve("settings").unwrap();
    let settings = value.get::<serde_json::Value>().unwrap();
    assert_eq!(settings["name"], "dizzy");

    container.register("missing", Value::new("./missing.json")).from_module();
    assert!(container.resolve("missing").unwrap_err().is_module_load());
}

#[test]
fn test_from_module_factories() {
    let loader = StaticModuleLoader::new().with_module(
        "logger",
        Value::from(Function::from_source("(prefix) => ...", |args| {
            Ok(Value::new(format!("{}: ready", args.get::<String>(0)?)))
        })),
    );
    let container = Container::with_config(ContainerConfig::new().with_module_loader(loader));
    container.register("prefix", Value::new("app".to_string()));
    container.register("logger", Value::new("logger")).from_module().as_factory();

    assert_eq!(text(&container.resolve("logger").unwrap()), "app: ready");
}

#[test]
fn test_register_bulk() {
    let container = Container::new();
    let empty = container.register_bulk(Vec::<(Key, Value)>::new());
    assert!(empty.cached().is_empty());

    let (one, one_calls) = counter();
    let (two, two_calls) = counter();
    let bulk = container.register_bulk([("one", one), ("two", two)]);
    bulk.as_factory().cached();

    for _ in 0..3 {
        container.resolve("one").unwrap();
        container.resolve("two").unwrap();
    }
    assert_eq!(one_calls.load(Ordering::SeqCst), 1);
    assert_eq!(two_calls.load(Ordering::SeqCst), 1);
    assert_eq!(container.list(), Key::list(["one", "two"]));
}

#[test]
fn test_injectable_macro() {
    let container = Container::new();
    container.register("left", Value::new(20_i32));
    container.register("right", Value::new(22_i32));
    container
        .register(
            "sum",
            injectable!(|left, right| {
                let left = left.ok_or(CoreError::MissingArgument { index: 0 })?;
                let right = right.ok_or(CoreError::MissingArgument { index: 1 })?;
                Ok(Value::new(left.get::<i32>()? + right.get::<i32>()?))
            }),
        )
        .as_factory();

    assert_eq!(container.resolve("sum").unwrap().get::<i32>().unwrap(), &42);

    let constant = injectable!(|| Ok(Value::new("constant")));
    assert!(constant.parameter_names().is_empty());
}

#[tokio::test]
async fn test_context_reaches_factories() {
    let container = Container::new();
    let receiver = Value::new("receiver".to_string());
    container
        .register(
            "whoami",
            Function::new(|args| {
                let context = args.context().ok_or(CoreError::factory("no context"))?;
                Ok(Value::new(format!("called on {}", context.get::<String>()?)))
            }),
        )
        .as_factory()
        .with_context(receiver);

    assert_eq!(text(&container.resolve("whoami").unwrap()), "called on receiver");
    let value = container.resolve_async("whoami").await.unwrap();
    assert_eq!(text(&value), "called on receiver");
}

#[test]
fn test_nested_factories_resolve_depth_first() {
    let container = Container::new();
    container.register("base", Value::new(2_i32));
    container
        .register(
            "double",
            Function::from_source("(base) => base * 2", |args| {
                Ok(Value::new(args.get::<i32>(0)? * 2))
            }),
        )
        .as_factory();
    container
        .register(
            "quadruple",
            Function::from_source("(double) => double * 2", |args| {
                Ok(Value::new(args.get::<i32>(0)? * 2))
            }),
        )
        .as_factory();

    assert_eq!(container.resolve("quadruple").unwrap().get::<i32>().unwrap(), &8);
}

#[test]
fn test_provider_outliving_container() {
    let container = Container::new();
    container.register("target", Value::new(1_u8));
    let alias = container.register("alias", Value::new("target"));
    alias.from_container();
    drop(container);

    assert!(matches!(alias.provide(), Err(CoreError::ContainerDropped)));
}
