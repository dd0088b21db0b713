use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn};

mod node_sub;
use node_sub::{parse_inputs, parse_outputs, NodeSubArgs};

/// Publish a function as a node type.
///
/// ```ignore
/// #[node_sub(tag = "!add", outputs(total))]
/// pub fn add(a: i64, b: i64) -> anyhow::Result<i64> { Ok(a + b) }
/// ```
///
/// keeps `add` as is and generates `add_node() -> NodeDef<i64>`. The inputs
/// are the parameter names in order. With several outputs the function
/// returns a tuple with one element per output.
#[proc_macro_attribute]
pub fn node_sub(args: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(args.into()) {
        Ok(list) => list,
        Err(e) => return TokenStream::from(darling::Error::from(e).write_errors()),
    };
    let args = match NodeSubArgs::from_list(&attr_args) {
        Ok(args) => args,
        Err(e) => return TokenStream::from(e.write_errors()),
    };

    let func = parse_macro_input!(item as ItemFn);

    let inputs = match parse_inputs(&func) {
        Ok(inputs) => inputs,
        Err(e) => return e.to_compile_error().into(),
    };
    let outputs = match parse_outputs(&args) {
        Ok(outputs) => outputs,
        Err(e) => return e.to_compile_error().into(),
    };
    if outputs.is_empty() {
        return syn::Error::new_spanned(&func.sig.ident, "node_sub needs at least one output")
            .to_compile_error()
            .into();
    }

    let value_ty = match (&args.value, inputs.first()) {
        (Some(ty), _) => match syn::parse_str::<syn::Type>(ty) {
            Ok(ty) => ty,
            Err(e) => return e.to_compile_error().into(),
        },
        (None, Some(first)) => first.ty.clone(),
        (None, None) => {
            return syn::Error::new_spanned(
                &func.sig.ident,
                "node_sub on a function without parameters needs `value = \"Type\"`",
            )
            .to_compile_error()
            .into()
        }
    };

    let vis = &func.vis;
    let fn_ident = &func.sig.ident;
    let def_ident = format_ident!("{}_node", fn_ident);
    let tag = &args.tag;

    let input_idents: Vec<_> = inputs.iter().map(|p| &p.ident).collect();
    let input_names: Vec<String> = input_idents.iter().map(|i| i.to_string()).collect();
    let output_names: Vec<String> = outputs.iter().map(|i| i.to_string()).collect();

    let bind_inputs = if input_idents.is_empty() {
        quote! { let _ = args; }
    } else {
        quote! {
            let mut values = args.into_values().into_iter();
            #(
                let #input_idents = values.next().ok_or_else(|| {
                    ::assembly::anyhow::anyhow!("argument `{}` is not bound", #input_names)
                })?;
            )*
        }
    };

    let emit = if outputs.len() == 1 {
        quote! { ::core::result::Result::Ok(::assembly::core::Emit::One(result)) }
    } else {
        let slots: Vec<_> = (0..outputs.len()).map(|i| format_ident!("out{}", i)).collect();
        quote! {
            let (#(#slots),*) = result;
            ::core::result::Result::Ok(::assembly::core::Emit::Many(vec![#(#slots),*]))
        }
    };

    let doc = format!("Node type `{}` wrapping [`{}`].", tag, fn_ident);

    let expanded = quote! {
        #func

        #[doc = #doc]
        #vis fn #def_ident() -> ::assembly::registry::NodeDef<#value_ty> {
            ::assembly::registry::NodeDef::new(
                #tag,
                &[#(#input_names),*],
                &[#(#output_names),*],
                |args: ::assembly::core::Args<#value_ty>|
                    -> ::assembly::anyhow::Result<::assembly::core::Emit<#value_ty>> {
                    #bind_inputs
                    let result = #fn_ident(#(#input_idents),*)?;
                    #emit
                },
            )
        }
    };

    TokenStream::from(expanded)
}
