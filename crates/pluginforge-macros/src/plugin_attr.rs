//! `#[plugin]`: registers a struct as a plugin type.
//!
//! Uses the same `linkme::distributed_slice` contribution pattern used
//! elsewhere in this codebase for transport capability registration,
//! applied here to a struct rather than a free function: the struct is
//! left untouched and a handful of sibling items are appended alongside it.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemStruct;

pub fn expand(item: TokenStream) -> syn::Result<TokenStream> {
    let item_struct: ItemStruct = syn::parse2(item)?;
    let ident = item_struct.ident.clone();
    let upper = ident.to_string().to_uppercase();
    let lower = ident.to_string().to_lowercase();

    let fragments_ident = format_ident!("__PLUGINFORGE_HANDLER_FRAGMENTS_{}", upper);
    let registration_ident = format_ident!("__PLUGINFORGE_REGISTRATION_{}", upper);
    let construct_ident = format_ident!("__pluginforge_construct_{}", lower);
    let handlers_ident = format_ident!("__pluginforge_handlers_{}", lower);

    Ok(quote! {
        #item_struct

        /// Per-type handler fragments, one entry per `#[plugin_handlers]`
        /// block targeting this struct in this module.
        #[pluginforge_core::linkme::distributed_slice]
        #[linkme(crate = pluginforge_core::linkme)]
        pub(crate) static #fragments_ident: [fn() -> ::std::vec::Vec<pluginforge_core::handler::HandlerDescriptor>] = [..];

        fn #construct_ident() -> ::std::result::Result<
            ::std::sync::Arc<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync>,
            ::anyhow::Error,
        > {
            ::std::result::Result::Ok(::std::sync::Arc::new(
                <#ident as ::std::default::Default>::default(),
            ) as ::std::sync::Arc<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync>)
        }

        fn #handlers_ident() -> &'static [pluginforge_core::handler::HandlerDescriptor] {
            static __CACHE: ::std::sync::OnceLock<::std::vec::Vec<pluginforge_core::handler::HandlerDescriptor>> =
                ::std::sync::OnceLock::new();
            __CACHE.get_or_init(|| {
                // Fragments are unioned across every contributing block,
                // keyed by (phase, method name); a later contribution
                // overriding the same key replaces the earlier one in
                // place (the "override beats inherited default" rule)
                // without disturbing declaration order — a `HashMap`
                // alone would lose the order guarantee spec §5 requires
                // for a plugin's own handler sequence.
                let mut order: ::std::vec::Vec<(&'static str, &'static str)> = ::std::vec::Vec::new();
                let mut by_key: ::std::collections::HashMap<
                    (&'static str, &'static str),
                    pluginforge_core::handler::HandlerDescriptor,
                > = ::std::collections::HashMap::new();
                for fragment in #fragments_ident.iter() {
                    for descriptor in fragment() {
                        let phase = match &descriptor.kind {
                            pluginforge_core::handler::HandlerKind::Init => "init",
                            pluginforge_core::handler::HandlerKind::Destroy => "destroy",
                            pluginforge_core::handler::HandlerKind::Event(_) => "event",
                        };
                        let key = (phase, descriptor.method_name);
                        if !by_key.contains_key(&key) {
                            order.push(key);
                        }
                        by_key.insert(key, descriptor);
                    }
                }
                order
                    .into_iter()
                    .map(|key| by_key.remove(&key).expect("key was just inserted"))
                    .collect()
            })
        }

        #[pluginforge_core::linkme::distributed_slice(pluginforge_core::plugin::PLUGIN_REGISTRY)]
        #[linkme(crate = pluginforge_core::linkme)]
        static #registration_ident: pluginforge_core::plugin::PluginRegistration =
            pluginforge_core::plugin::PluginRegistration {
                type_name: concat!(module_path!(), "::", stringify!(#ident)),
                construct: #construct_ident,
                handlers: #handlers_ident,
            };
    })
}
