//! `#[plugin_handlers]`: scans an `impl` block for marker-annotated methods
//! and turns each into a [`HandlerDescriptor`] contribution.
//!
//! `#[init]`, `#[destroy]`, `#[event("name")]`, `#[events("a", "b")]`, and
//! `#[dep_name("name")]` are recognized here and stripped from the emitted
//! block — they carry no runtime representation of their own, only the
//! descriptors this macro builds from them.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    punctuated::Punctuated, Attribute, FnArg, Ident, ImplItem, ItemImpl, LitStr, Token, Type,
};

pub fn expand(item: TokenStream) -> syn::Result<TokenStream> {
    let mut impl_block: ItemImpl = syn::parse2(item)?;
    let self_ty = (*impl_block.self_ty).clone();
    let self_ty_ident = last_path_ident(&self_ty)?;
    let fragments_ident = format_ident!(
        "__PLUGINFORGE_HANDLER_FRAGMENTS_{}",
        self_ty_ident.to_string().to_uppercase()
    );
    let fragment_fn_ident = format_ident!(
        "__pluginforge_handler_fragment_{}",
        self_ty_ident.to_string().to_lowercase()
    );
    let contrib_ident = format_ident!(
        "__PLUGINFORGE_CONTRIB_{}",
        self_ty_ident.to_string().to_uppercase()
    );

    let mut descriptor_tokens = Vec::new();

    for impl_item in impl_block.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let Some(kind_tokens) = extract_handler_kind(&mut method.attrs)? else {
            continue;
        };

        let method_name = method.sig.ident.clone();
        let method_name_str = method_name.to_string();

        let mut param_specs = Vec::new();
        let mut downcast_stmts = Vec::new();
        let mut call_args = Vec::new();
        let mut arg_index = 0usize;

        for input in method.sig.inputs.iter_mut() {
            let FnArg::Typed(pat_type) = input else {
                continue; // &self / self
            };
            let dep_name = extract_dep_name(&mut pat_type.attrs)?;
            let inner_ty = unwrap_reference(&pat_type.ty);
            let is_handle = is_plugin_handle(&inner_ty);
            let arg_ident = format_ident!("__arg{}", arg_index);

            if is_handle {
                param_specs.push(quote! { pluginforge_core::handler::ParamSpec::handle() });
            } else if let Some(name) = &dep_name {
                param_specs.push(quote! {
                    pluginforge_core::handler::ParamSpec::named::<#inner_ty>(#name)
                });
            } else {
                param_specs.push(quote! {
                    pluginforge_core::handler::ParamSpec::of::<#inner_ty>()
                });
            }

            downcast_stmts.push(quote! {
                let #arg_ident = __args[#arg_index].clone().downcast::<#inner_ty>().map_err(|_| {
                    ::anyhow::anyhow!(concat!(
                        "dependency type mismatch for a parameter of `",
                        #method_name_str,
                        "`"
                    ))
                })?;
            });
            call_args.push(quote! { #arg_ident.as_ref() });
            arg_index += 1;
        }

        let invoke_ident = format_ident!("__pluginforge_invoke_{}", method_name);
        descriptor_tokens.push(quote! {
            {
                fn #invoke_ident() -> pluginforge_core::handler::InvokeFn {
                    ::std::sync::Arc::new(move |__plugin, __args| -> pluginforge_core::handler::HandlerFuture {
                        ::std::boxed::Box::pin(async move {
                            let __self = __plugin.downcast::<#self_ty>().map_err(|_| {
                                ::anyhow::anyhow!("plugin instance downcast failed")
                            })?;
                            #(#downcast_stmts)*
                            #self_ty::#method_name(__self.as_ref(), #(#call_args),*)
                                .await
                                .map_err(::std::convert::Into::into)
                        })
                    })
                }

                pluginforge_core::handler::HandlerDescriptor {
                    owner_plugin: concat!(module_path!(), "::", stringify!(#self_ty)),
                    method_name: #method_name_str,
                    kind: #kind_tokens,
                    params: ::std::vec![ #(#param_specs),* ],
                    invoke: #invoke_ident(),
                }
            }
        });
    }

    Ok(quote! {
        #impl_block

        fn #fragment_fn_ident() -> ::std::vec::Vec<pluginforge_core::handler::HandlerDescriptor> {
            ::std::vec![ #(#descriptor_tokens),* ]
        }

        #[pluginforge_core::linkme::distributed_slice(#fragments_ident)]
        #[linkme(crate = pluginforge_core::linkme)]
        static #contrib_ident: fn() -> ::std::vec::Vec<pluginforge_core::handler::HandlerDescriptor> =
            #fragment_fn_ident;
    })
}

fn last_path_ident(ty: &Type) -> syn::Result<Ident> {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|seg| seg.ident.clone())
            .ok_or_else(|| syn::Error::new(Span::call_site(), "expected a named `impl` target type")),
        other => Err(syn::Error::new_spanned(
            other,
            "`#[plugin_handlers]` requires a named `impl` target type",
        )),
    }
}

fn unwrap_reference(ty: &Type) -> Type {
    match ty {
        Type::Reference(r) => (*r.elem).clone(),
        other => other.clone(),
    }
}

fn is_plugin_handle(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|seg| seg.ident == "PluginHandle")
            .unwrap_or(false),
        _ => false,
    }
}

/// Reads and strips `#[init]`/`#[destroy]`/`#[event("name")]`/
/// `#[events("a", "b")]` from `attrs`. Returns `None` (leaving other
/// attributes untouched) when the method carries none of these markers,
/// meaning it is a plain method, not a handler.
fn extract_handler_kind(attrs: &mut Vec<Attribute>) -> syn::Result<Option<TokenStream>> {
    let mut is_init = false;
    let mut is_destroy = false;
    let mut event_names: Vec<LitStr> = Vec::new();

    for attr in attrs.iter() {
        if attr.path().is_ident("init") {
            is_init = true;
        } else if attr.path().is_ident("destroy") {
            is_destroy = true;
        } else if attr.path().is_ident("event") {
            event_names.push(attr.parse_args::<LitStr>()?);
        } else if attr.path().is_ident("events") {
            let list = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
            event_names.extend(list);
        }
    }

    attrs.retain(|attr| {
        !(attr.path().is_ident("init")
            || attr.path().is_ident("destroy")
            || attr.path().is_ident("event")
            || attr.path().is_ident("events"))
    });

    let mut seen = std::collections::HashSet::new();
    event_names.retain(|lit| seen.insert(lit.value()));

    if is_init {
        Ok(Some(quote! { pluginforge_core::handler::HandlerKind::Init }))
    } else if is_destroy {
        Ok(Some(quote! { pluginforge_core::handler::HandlerKind::Destroy }))
    } else if !event_names.is_empty() {
        Ok(Some(quote! {
            pluginforge_core::handler::HandlerKind::Event(::std::vec![
                #(#event_names.to_string()),*
            ])
        }))
    } else {
        Ok(None)
    }
}

/// Reads and strips `#[dep_name("name")]` from a parameter's attributes.
fn extract_dep_name(attrs: &mut Vec<Attribute>) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    for attr in attrs.iter() {
        if attr.path().is_ident("dep_name") {
            name = Some(attr.parse_args::<LitStr>()?);
        }
    }
    attrs.retain(|attr| !attr.path().is_ident("dep_name"));
    Ok(name)
}
