use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::Parse, parse_macro_input, spanned::Spanned, FnArg, GenericArgument, ImplItem,
    ImplItemFn, ItemImpl, LitStr, PathArguments, ReturnType, Token, Type,
};

/// Proc macro attribute that turns an `impl` block with an async `call` method into a tool.
///
/// Apply this to an `impl` block that contains
/// `async fn call(&self, ctx: &InvocationContext, params: P) -> Result<T, ToolError>`.
/// The macro will:
/// - Use the provided tool name, description, label and ACL from attributes
/// - Infer the parameter type `P` from the last argument of `call`
/// - Check that `call` returns `Result<T, ToolError>` for some serializable `T`
/// - Generate the `algolia_mcp::tools::Tool` implementation, whose `execute`
///   forwards to `call` and serializes the output
///
/// Because `P` is read off the handler signature, the input schema advertised for a
/// tool is always the schema of the type its handler decodes.
///
/// # Example
/// ```ignore
/// pub struct GetLatency;
///
/// #[tool(
///     name = "monitoring_get_latency",
///     description = "Retrieves the average latency for search requests for selected clusters",
///     label = "Latency"
/// )]
/// impl GetLatency {
///     async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
///         // Implementation
///     }
/// }
/// ```
struct ToolArgs {
    name: LitStr,
    description: LitStr,
    label: Option<LitStr>,
    acl: Option<LitStr>,
}

impl Parse for ToolArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut description = None;
        let mut label = None;
        let mut acl = None;

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            match key.to_string().as_str() {
                "name" => name = Some(value),
                "description" => description = Some(value),
                "label" => label = Some(value),
                "acl" => acl = Some(value),
                _ => {
                    return Err(syn::Error::new(
                        key.span(),
                        "expected 'name', 'description', 'label' or 'acl'",
                    ))
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        let name = name.ok_or_else(|| input.error("missing 'name' attribute"))?;
        if name.value().is_empty() {
            return Err(syn::Error::new(name.span(), "tool name must not be empty"));
        }

        Ok(ToolArgs {
            name,
            description: description
                .ok_or_else(|| input.error("missing 'description' attribute"))?,
            label,
            acl,
        })
    }
}

#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ToolArgs);
    let impl_block = parse_macro_input!(item as ItemImpl);

    match expand(args, impl_block) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: ToolArgs, impl_block: ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    let self_ty = &impl_block.self_ty;
    if !matches!(&**self_ty, Type::Path(_)) {
        return Err(syn::Error::new(
            self_ty.span(),
            "#[tool] can only be applied to impl blocks for named types",
        ));
    }

    let call_method = find_call_method(&impl_block)?;
    let input_type = extract_input_type(call_method)?;

    match &call_method.sig.output {
        ReturnType::Type(_, ty) if extract_result_ok_type(ty).is_some() => {}
        output => {
            return Err(syn::Error::new(
                output.span(),
                "call method must return Result<T, ToolError>",
            ))
        }
    }

    let tool_name = args.name.value();
    let tool_description = args.description.value();
    let tool_label = args
        .label
        .map(|l| l.value())
        .unwrap_or_else(|| tool_name.clone());
    let required_acl = match args.acl {
        Some(acl) => {
            let acl = acl.value();
            quote! { ::core::option::Option::Some(#acl) }
        }
        None => quote! { ::core::option::Option::None },
    };

    let (impl_generics, _, where_clause) = impl_block.generics.split_for_impl();

    Ok(quote! {
        #impl_block

        #[::algolia_mcp::__private::async_trait]
        impl #impl_generics ::algolia_mcp::tools::Tool for #self_ty #where_clause {
            type Params = #input_type;

            fn name(&self) -> &'static str {
                #tool_name
            }

            fn description(&self) -> &'static str {
                #tool_description
            }

            fn label(&self) -> &'static str {
                #tool_label
            }

            fn required_acl(&self) -> ::core::option::Option<&'static str> {
                #required_acl
            }

            async fn execute(
                &self,
                ctx: &::algolia_mcp::dispatch::InvocationContext,
                params: Self::Params,
            ) -> ::core::result::Result<
                ::algolia_mcp::__private::serde_json::Value,
                ::algolia_mcp::tools::ToolError,
            > {
                let output = <#self_ty>::call(self, ctx, params).await?;

                ::algolia_mcp::__private::serde_json::to_value(output)
                    .map_err(|e| ::algolia_mcp::tools::ToolError::Encoding(e.to_string()))
            }
        }
    })
}

fn find_call_method(impl_block: &ItemImpl) -> syn::Result<&ImplItemFn> {
    impl_block
        .items
        .iter()
        .find_map(|item| match item {
            ImplItem::Fn(method) if method.sig.ident == "call" => Some(method),
            _ => None,
        })
        .ok_or_else(|| {
            syn::Error::new(
                impl_block.self_ty.span(),
                "tool impl must contain an async fn call method",
            )
        })
}

/// The parameter type is the last typed argument: `call(&self, ctx, params)`.
fn extract_input_type(method: &ImplItemFn) -> syn::Result<&Type> {
    if method.sig.asyncness.is_none() {
        return Err(syn::Error::new(
            method.sig.fn_token.span(),
            "call method must be async",
        ));
    }

    let typed: Vec<&Type> = method
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(&*pat_type.ty),
            FnArg::Receiver(_) => None,
        })
        .collect();

    match typed.as_slice() {
        [_ctx, params] => Ok(*params),
        _ => Err(syn::Error::new(
            method.sig.inputs.span(),
            "call method must take (&self, ctx: &InvocationContext, params: P)",
        )),
    }
}

/// Extract the Ok type from Result<T, E>
fn extract_result_ok_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Result" {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(ok_type)) = args.args.first() {
                    return Some(ok_type);
                }
            }
        }
    }
    None
}
