/// Build a [`Function`](crate::Function) from a closure, using the closure's
/// parameter names as its dependency keys
///
/// Each parameter is bound to an `Option<Value>`, `None` when the caller
/// supplied fewer arguments than declared. The body must evaluate to
/// `Result<Value>`.
///
/// ```
/// use dizzy_core::{injectable, Container, CoreError, Value};
///
/// let container = Container::new();
/// container.register("name", Value::new("world".to_string()));
///
/// let greet = injectable!(|name| {
///     let name = name.ok_or(CoreError::MissingArgument { index: 0 })?;
///     Ok(Value::new(format!("hello {}", name.get::<String>()?)))
/// });
///
/// let greeting = container.call(&greet, None, None).unwrap();
/// assert_eq!(greeting.get::<String>().unwrap(), "hello world");
/// ```
#[macro_export]
macro_rules! injectable {
    (|| $body:expr) => {
        $crate::Function::new(move |_args: $crate::Args| -> $crate::Result<$crate::Value> { $body })
    };
    (|$($param:ident),* $(,)?| $body:expr) => {
        $crate::Function::from_source(
            stringify!(|$($param),*| $body),
            move |args: $crate::Args| -> $crate::Result<$crate::Value> {
                #[allow(unused_mut)]
                let mut values = args.into_values().into_iter();
                $(
                    let $param: Option<$crate::Value> = values.next();
                )*
                $body
            },
        )
    };
}
