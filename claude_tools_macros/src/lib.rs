mod function_schema;
mod schema_extraction;

use proc_macro::TokenStream;

/// Implements `claude_tools_rs::schema::FunctionSchema` for a named-field struct.
///
/// ```ignore
/// /// Get the current weather for a location.
/// #[function_schema(name = "GetWeather")]
/// #[derive(Debug, Deserialize, JsonSchema)]
/// struct GetWeather {
///     /// City and state, e.g. San Francisco, CA
///     location: String,
/// }
/// ```
///
/// `name` defaults to the struct name and `description` to the struct's doc
/// comment. Field doc comments become property descriptions.
#[proc_macro_attribute]
pub fn function_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    function_schema::function_schema(attr, item)
}
