use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::inference::infer_parameter_names;
use crate::container::key::Key;
use crate::container::value::Value;
use crate::errors::{CoreError, Result};

type Body = dyn Fn(Args) -> Result<Value> + Send + Sync;

/// Positional arguments handed to a function or constructor body
///
/// Reading past the end yields `None`: an override list shorter than the
/// declared parameters leaves the trailing parameters absent.
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<Value>,
    context: Option<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            context: None,
        }
    }

    /// Attach the receiver a function is invoked with
    pub fn with_context(mut self, context: Option<Value>) -> Self {
        self.context = context;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`, or `None` when absent
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Argument at `index`, failing when absent
    pub fn require(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or(CoreError::MissingArgument { index })
    }

    /// Argument at `index` borrowed as `T`
    pub fn get<T: Any>(&self, index: usize) -> Result<&T> {
        self.require(index)?.get::<T>()
    }

    /// Receiver set through `Provider::with_context` or `Container::call`
    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("values", &self.values)
            .field("context", &self.context)
            .finish()
    }
}

/// Injectable callable
///
/// A function declares the keys of the dependencies it wants, in order.
/// The list is either given explicitly or inferred from signature text.
#[derive(Clone)]
pub struct Function {
    params: Arc<[Key]>,
    body: Arc<Body>,
}

impl Function {
    /// Function that declares no dependencies
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_params(Vec::<Key>::new(), body)
    }

    /// Function with an explicit, ordered dependency key list
    pub fn with_params<I, K, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            params: Key::list(params).into(),
            body: Arc::new(body),
        }
    }

    /// Function whose dependency keys are inferred from its signature text
    ///
    /// ```
    /// use dizzy_core::{Function, Key, Value};
    ///
    /// let shout = Function::from_source("(greeting) => greeting.toUpperCase()", |args| {
    ///     let greeting = args.get::<String>(0)?;
    ///     Ok(Value::new(greeting.to_uppercase()))
    /// });
    /// assert_eq!(shout.parameter_names(), &[Key::from("greeting")]);
    /// ```
    pub fn from_source<F>(source: &str, body: F) -> Self
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_params(infer_parameter_names(source), body)
    }

    pub fn parameter_names(&self) -> &[Key] {
        &self.params
    }

    /// Run the body with already resolved arguments
    pub fn invoke(&self, args: Args) -> Result<Value> {
        (self.body)(args)
    }

    pub fn ptr_eq(a: &Function, b: &Function) -> bool {
        Arc::ptr_eq(&a.body, &b.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish()
    }
}

/// Injectable constructor producing instances of one concrete type
#[derive(Clone)]
pub struct Constructor {
    type_name: &'static str,
    params: Arc<[Key]>,
    body: Arc<Body>,
}

impl Constructor {
    /// Constructor with an explicit, ordered dependency key list
    pub fn new<T, I, K, F>(params: I, build: F) -> Self
    where
        T: Any + Send + Sync,
        I: IntoIterator<Item = K>,
        K: Into<Key>,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            params: Key::list(params).into(),
            body: Arc::new(move |args| build(args).map(Value::new)),
        }
    }

    /// Constructor whose dependency keys are inferred from the type's source text
    ///
    /// The text may be a whole class declaration; only the `constructor(...)`
    /// parameter list is used.
    pub fn from_source<T, F>(source: &str, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(infer_parameter_names(source), build)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parameter_names(&self) -> &[Key] {
        &self.params
    }

    /// Build a new instance from already resolved arguments
    ///
    /// Constructors never see a context.
    pub fn construct(&self, args: Args) -> Result<Value> {
        (self.body)(args.with_context(None))
    }

    pub fn ptr_eq(a: &Constructor, b: &Constructor) -> bool {
        Arc::ptr_eq(&a.body, &b.body)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("type_name", &self.type_name)
            .field("params", &self.params)
            .finish()
    }
}
