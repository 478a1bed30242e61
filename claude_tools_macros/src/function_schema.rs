use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemStruct, LitStr};

use crate::schema_extraction::{
    collect_doc_comments, collect_field_docs, ensure_named_struct, infer_description,
    infer_function_name, parse_function_schema_args,
};

pub fn function_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_function_schema_args(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let item_struct = parse_macro_input!(item as ItemStruct);

    if let Err(err) = ensure_named_struct(&item_struct) {
        return err.to_compile_error().into();
    }

    if !item_struct.generics.params.is_empty() {
        return syn::Error::new(
            item_struct.generics.span(),
            "`#[function_schema]` does not support generic structs",
        )
        .to_compile_error()
        .into();
    }

    let function_name = infer_function_name(&item_struct, args.name.as_ref());
    let struct_docs = collect_doc_comments(&item_struct.attrs);
    let description = infer_description(args.description.as_ref(), struct_docs);

    let (description_tokens, description_text) = match &description {
        Some(lit) => (quote! { Some(#lit) }, quote! { #lit }),
        None => (quote! { None }, quote! { "" }),
    };

    let field_doc_tokens: Vec<_> = collect_field_docs(&item_struct)
        .iter()
        .map(|(field, doc)| {
            let field_lit = LitStr::new(field, Span::call_site());
            let doc_lit = LitStr::new(doc, Span::call_site());
            quote! { (#field_lit, #doc_lit) }
        })
        .collect();

    let ident = &item_struct.ident;

    let expanded = quote! {
        #item_struct

        impl claude_tools_rs::schema::FunctionSchema for #ident {
            fn tool_schema() -> &'static claude_tools_rs::ToolSchema {
                static SCHEMA: std::sync::OnceLock<claude_tools_rs::ToolSchema> = std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    let mut root = schemars::schema_for!(Self);
                    claude_tools_rs::schema::apply_doc_comments(
                        &mut root,
                        #function_name,
                        #description_tokens,
                        &[#(#field_doc_tokens),*],
                    );
                    claude_tools_rs::ToolSchema::from_root_schema(
                        #function_name,
                        #description_text,
                        root,
                    )
                })
            }
        }
    };

    expanded.into()
}
