use darling::util::PathList;
use darling::FromMeta;
use syn::{FnArg, Ident, ItemFn, Pat, Type};

/// Parsed arguments of #[node_sub(...)]
#[derive(Debug, FromMeta)]
pub struct NodeSubArgs {
    pub tag: String,

    pub outputs: PathList,

    /// Payload type, only needed when the function has no parameters
    #[darling(default)]
    pub value: Option<String>,
}

/// One input port, taken from a function parameter
pub struct InputParam {
    pub ident: Ident,
    pub ty: Type,
}

pub fn parse_inputs(func: &ItemFn) -> syn::Result<Vec<InputParam>> {
    func.sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => Ok(InputParam {
                    ident: pat_ident.ident.clone(),
                    ty: (*pat_type.ty).clone(),
                }),
                other => Err(syn::Error::new_spanned(
                    other,
                    "node_sub parameters must be plain identifiers",
                )),
            },
            FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(
                receiver,
                "node_sub cannot be applied to methods",
            )),
        })
        .collect()
}

pub fn parse_outputs(args: &NodeSubArgs) -> syn::Result<Vec<Ident>> {
    args.outputs
        .iter()
        .map(|path| {
            path.get_ident()
                .cloned()
                .ok_or_else(|| syn::Error::new_spanned(path, "output names must be identifiers"))
        })
        .collect()
}
