// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Fields, FieldsNamed,
    Generics, LitStr,
};

/// Container-level `#[reflect(..)]` options.
#[derive(Default)]
struct ContainerAttrs {
    /// Non-final: values declared with this type may hold a descendant.
    open: bool,
    /// Decode through `Default::default()` plus field setters.
    default: bool,
}

/// Field/variant-level `#[reflect(..)]` options.
#[derive(Default)]
struct MemberAttrs {
    parent: bool,
    skip: bool,
    rename: Option<String>,
}

fn container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("open") {
                out.open = true;
                Ok(())
            } else if meta.path.is_ident("default") {
                out.default = true;
                Ok(())
            } else {
                Err(meta.error("expected `open` or `default`"))
            }
        })?;
    }
    Ok(out)
}

fn member_attrs(attrs: &[Attribute]) -> syn::Result<MemberAttrs> {
    let mut out = MemberAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                out.parent = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let name: LitStr = meta.value()?.parse()?;
                out.rename = Some(name.value());
                Ok(())
            } else {
                Err(meta.error("expected `parent`, `skip` or `rename = \"..\"`"))
            }
        })?;
    }
    Ok(out)
}

/// Add `Reflect + AnyValue` bounds to every type parameter.
fn bounded(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(parse_quote!(::polycodec::reflect::Reflect));
        param
            .bounds
            .push(parse_quote!(::polycodec::reflect::AnyValue));
    }
    generics
}

/// `#[derive(Reflect)]`: generates the type descriptor.
///
/// Structs with named fields become objects, field-less enums become enums
/// encoded by variant name.
///
/// Container options:
/// - `#[reflect(open)]`: non-final; `Dyn<Self>` values may hold descendants
/// - `#[reflect(default)]`: decode via `Default::default()` and field setters
///   instead of the generated constructor
///
/// Field options:
/// - `#[reflect(parent)]`: the embedded value is the type this one extends
/// - `#[reflect(rename = "name")]`: external name (also on enum variants)
/// - `#[reflect(skip)]`: not encoded; rebuilt with `Default::default()`
///
/// Example:
/// ```ignore
/// use polycodec::Reflect;
///
/// #[derive(Reflect, Default)]
/// #[reflect(open, default)]
/// struct Animal {
///     name: String,
/// }
///
/// #[derive(Reflect)]
/// struct Dog {
///     #[reflect(parent)]
///     base: Animal,
///     #[reflect(rename = "breed_name")]
///     breed: String,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let result = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => derive_object(&input, fields),
            _ => Err(syn::Error::new_spanned(
                &input,
                "Reflect supports structs with named fields only",
            )),
        },
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(&input, "Reflect does not support unions")),
    };
    result.unwrap_or_else(syn::Error::into_compile_error).into()
}

fn derive_object(input: &DeriveInput, fields: &FieldsNamed) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let container = container_attrs(&input.attrs)?;
    let generics = bounded(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut field_infos = Vec::new();
    let mut takes = Vec::new();
    let mut inits = Vec::new();
    let mut parent: Option<(syn::Ident, syn::Type)> = None;

    for field in &fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "field must have a name"))?;
        let ty = &field.ty;
        let attrs = member_attrs(&field.attrs)?;
        let local = format_ident!("__field_{}", ident.unraw());

        if attrs.parent {
            if parent.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[reflect(parent)]",
                ));
            }
            parent = Some((ident.clone(), ty.clone()));
            inits.push(quote! { #ident: #local });
            continue;
        }
        if attrs.skip {
            inits.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let external = attrs.rename.unwrap_or_else(|| ident.unraw().to_string());
        field_infos.push(quote! {
            ::polycodec::reflect::FieldInfo::new(
                #external,
                <#ty as ::polycodec::reflect::Reflect>::type_info,
                |owner| {
                    owner
                        .downcast_ref::<Self>()
                        .map(|o| &o.#ident as &dyn ::polycodec::reflect::AnyValue)
                },
            )
            .with_setter(|target, value| {
                let target = ::polycodec::reflect::downcast_target::<Self>(target)?;
                target.#ident = ::polycodec::reflect::downcast_value::<#ty>(value)?;
                ::core::result::Result::Ok(())
            })
        });
        takes.push(quote! { let #local = args.take::<#ty>()?; });
        inits.push(quote! { #ident: #local });
    }

    let parent_info = match &parent {
        Some((ident, ty)) => {
            let local = format_ident!("__field_{}", ident.unraw());
            takes.push(quote! { let #local = args.take_parent::<#ty>()?; });
            quote! {
                .with_parent(::polycodec::reflect::ParentInfo {
                    type_info: <#ty as ::polycodec::reflect::Reflect>::type_info,
                    get: |owner| {
                        owner
                            .downcast_ref::<Self>()
                            .map(|o| &o.#ident as &dyn ::polycodec::reflect::AnyValue)
                    },
                    get_mut: |owner| {
                        owner
                            .downcast_mut::<Self>()
                            .map(|o| &mut o.#ident as &mut dyn ::core::any::Any)
                    },
                })
            }
        }
        None => quote! {},
    };

    let open = if container.open {
        quote! { .open() }
    } else {
        quote! {}
    };

    let default = if container.default {
        quote! {
            .with_default(|| {
                ::std::boxed::Box::new(<Self as ::core::default::Default>::default())
                    as ::std::boxed::Box<dyn ::polycodec::reflect::AnyValue>
            })
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl #impl_generics ::polycodec::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_info() -> ::polycodec::reflect::TypeInfo {
                let info = ::polycodec::reflect::ObjectInfo::new(::std::vec![#(#field_infos),*])
                    #parent_info
                    #open
                    #default
                    .with_constructor(|args| {
                        let _ = &args;
                        #(#takes)*
                        ::core::result::Result::Ok(
                            ::std::boxed::Box::new(Self { #(#inits),* })
                                as ::std::boxed::Box<dyn ::polycodec::reflect::AnyValue>,
                        )
                    });
                ::polycodec::reflect::TypeInfo::new::<Self>(
                    ::polycodec::reflect::Shape::Object(info),
                )
            }
        }
    })
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let generics = bounded(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut names = Vec::new();
    let mut index_arms = Vec::new();
    let mut build_arms = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Reflect supports field-less enum variants only",
            ));
        }
        let attrs = member_attrs(&variant.attrs)?;
        let ident = &variant.ident;
        names.push(attrs.rename.unwrap_or_else(|| ident.unraw().to_string()));
        index_arms.push(quote! { Self::#ident => #index });
        build_arms.push(quote! {
            #index => ::core::option::Option::Some(
                ::std::boxed::Box::new(Self::#ident)
                    as ::std::boxed::Box<dyn ::polycodec::reflect::AnyValue>,
            )
        });
    }

    Ok(quote! {
        impl #impl_generics ::polycodec::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_info() -> ::polycodec::reflect::TypeInfo {
                ::polycodec::reflect::TypeInfo::new::<Self>(::polycodec::reflect::Shape::Enum(
                    ::polycodec::reflect::EnumInfo {
                        variants: &[#(#names),*],
                        index_of: |value| {
                            value.downcast_ref::<Self>().map(|v| match v {
                                #(#index_arms,)*
                            })
                        },
                        from_index: |index| match index {
                            #(#build_arms,)*
                            _ => ::core::option::Option::None,
                        },
                    },
                ))
            }
        }
    })
}
