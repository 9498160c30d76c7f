extern crate proc_macro;

use itertools::izip;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashMap;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Fields, Generics, Ident, LitStr,
};

/// How a type reaches the wire, chosen by a container-level `#[cork(...)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Fields are written as a map (named) or an array (tuple).
    Fields,
    /// The type implements `cork::Corker`.
    Corker,
    /// The type implements `cork::Selfer`.
    Selfer,
}

/// Reads `#[cork(corker)]` or `#[cork(selfer)]` from the type attributes.
fn container_mode(attrs: &[Attribute]) -> syn::Result<Mode> {
    let mut mode = Mode::Fields;
    for attr in attrs {
        if !attr.path().is_ident("cork") {
            continue;
        }
        let ident = attr.parse_args::<Ident>()?;
        mode = if ident == "corker" {
            Mode::Corker
        } else if ident == "selfer" {
            Mode::Selfer
        } else {
            return Err(syn::Error::new(
                ident.span(),
                format!("unknown cork container attribute `{}`, expected `corker` or `selfer`", ident),
            ));
        };
    }
    Ok(mode)
}

/// Reads the `#[cork("...")]` tag of a field.
fn field_tag(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut tag = None;
    for attr in attrs {
        if attr.path().is_ident("cork") {
            tag = Some(attr.parse_args::<LitStr>()?);
        }
    }
    Ok(tag)
}

/// Wire name of a field, or `None` when the tag is `"-"`.
///
/// Mirrors `cork::parse_tag` so duplicated keys are caught at compile time.
fn wire_name(ident: &str, tag: Option<&LitStr>) -> Option<String> {
    let Some(tag) = tag else {
        return Some(ident.to_string());
    };
    let value = tag.value();
    if value == "-" {
        return None;
    }
    let name = value.split(',').next().unwrap_or_default();
    if name.is_empty() {
        Some(ident.to_string())
    } else {
        Some(name.to_string())
    }
}

/// Adds `bound + 'static` to every type parameter.
fn add_bounds(generics: &Generics, bound: TokenStream2) -> Generics {
    let mut generics = generics.clone();
    let params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: #bound + 'static));
    }
    generics
}

/// A named field with its parsed tag.
struct NamedField<'a> {
    ident: &'a Ident,
    tag: Option<LitStr>,
    skip: bool,
}

fn named_fields<'a>(name: &Ident, fields: &'a syn::FieldsNamed) -> syn::Result<Vec<NamedField<'a>>> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut out = Vec::new();
    for f in &fields.named {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let ident_str = ident.to_string();
        let tag = field_tag(&f.attrs)?;
        let wire = wire_name(&ident_str, tag.as_ref());
        if let Some(wire) = &wire {
            if let Some(other) = seen.insert(wire.clone(), ident_str.clone()) {
                return Err(syn::Error::new(
                    ident.span(),
                    format!(
                        "map key \"{}\" is used by both `{}` and `{}` in struct `{}`",
                        wire, other, ident_str, name
                    ),
                ));
            }
        }
        out.push(NamedField {
            ident,
            tag,
            skip: wire.is_none(),
        });
    }
    Ok(out)
}

/// The `FIELDS` table shared by the encoder and decoder impls.
fn raw_fields(fields: &[NamedField]) -> TokenStream2 {
    let entries = fields.iter().map(|f| {
        let ident_str = f.ident.to_string();
        let tag = match &f.tag {
            Some(lit) => quote! { ::core::option::Option::Some(#lit) },
            None => quote! { ::core::option::Option::None },
        };
        quote! { ::cork::fields::RawField { ident: #ident_str, tag: #tag } }
    });
    quote! { &[#(#entries),*] }
}

/// Derive macro for implementing the `Encoder` trait
///
/// Structs with named fields are written as a map keyed by field name, tuple
/// structs as an array and unit structs as nil.
///
/// # Supported Attributes
///
/// * `#[cork("name")]` - Use `name` as the map key
/// * `#[cork("name,omitempty")]` / `#[cork(",omitempty")]` - Leave the field out while it holds its empty value
/// * `#[cork("-")]` - Never write the field
/// * `#[cork(corker)]` / `#[cork(selfer)]` on the type - Write it through its extension protocol
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Encode)]
/// struct MyStruct {
///     #[cork("id")]
///     field1: i32,
///     #[cork("-")]
///     field2: String,
/// }
/// ```
#[proc_macro_derive(Encode, attributes(cork))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_encode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_encode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let mode = container_mode(&input.attrs)?;

    if mode != Mode::Fields {
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
        let call = match mode {
            Mode::Corker => quote! { ::cork::ext::encode_corker(self, writer) },
            _ => quote! { ::cork::ext::encode_selfer(self, writer) },
        };
        return Ok(quote! {
            impl #impl_generics ::cork::Encoder for #name #ty_generics #where_clause {
                fn encode(&self, writer: &mut ::cork::Writer) -> ::cork::Result<()> {
                    #call
                }

                fn is_default(&self) -> bool {
                    false
                }
            }
        });
    }

    let generics = add_bounds(&input.generics, quote!(::cork::Encoder));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Encode can only be derived for structs; implement cork::Encoder by hand for enums",
        ));
    };

    match &data.fields {
        Fields::Named(fields) => {
            let fields = named_fields(name, fields)?;
            let raw = raw_fields(&fields);
            let mut encode_arms = Vec::new();
            let mut default_arms = Vec::new();
            let mut default_checks = Vec::new();
            for (index, f) in fields.iter().enumerate() {
                if f.skip {
                    continue;
                }
                let ident = f.ident;
                encode_arms.push(quote! {
                    #index => ::cork::Encoder::encode(&self.#ident, writer),
                });
                default_arms.push(quote! {
                    #index => ::cork::Encoder::is_default(&self.#ident),
                });
                default_checks.push(quote! { ::cork::Encoder::is_default(&self.#ident) });
            }
            let is_default = if default_checks.is_empty() {
                quote! { true }
            } else {
                quote! { #(#default_checks)&&* }
            };
            Ok(quote! {
                impl #impl_generics ::cork::StructEncoder for #name #ty_generics #where_clause {
                    const FIELDS: &'static [::cork::fields::RawField] = #raw;

                    fn encode_field(&self, index: usize, writer: &mut ::cork::Writer) -> ::cork::Result<()> {
                        match index {
                            #(#encode_arms)*
                            _ => Ok(()),
                        }
                    }

                    fn field_is_default(&self, index: usize) -> bool {
                        match index {
                            #(#default_arms)*
                            _ => true,
                        }
                    }
                }

                impl #impl_generics ::cork::Encoder for #name #ty_generics #where_clause {
                    fn encode(&self, writer: &mut ::cork::Writer) -> ::cork::Result<()> {
                        ::cork::fields::encode_struct(self, writer)
                    }

                    fn is_default(&self) -> bool {
                        #is_default
                    }
                }
            })
        }
        Fields::Unnamed(fields) => {
            let count = fields.unnamed.len();
            let indices: Vec<syn::Index> = (0..count).map(syn::Index::from).collect();
            let is_default = if count == 0 {
                quote! { true }
            } else {
                quote! { #(::cork::Encoder::is_default(&self.#indices))&&* }
            };
            Ok(quote! {
                impl #impl_generics ::cork::Encoder for #name #ty_generics #where_clause {
                    fn encode(&self, writer: &mut ::cork::Writer) -> ::cork::Result<()> {
                        ::cork::fields::encode_tuple_header(writer, #count);
                        #(::cork::Encoder::encode(&self.#indices, writer)?;)*
                        Ok(())
                    }

                    fn is_default(&self) -> bool {
                        #is_default
                    }
                }
            })
        }
        Fields::Unit => Ok(quote! {
            impl #impl_generics ::cork::Encoder for #name #ty_generics #where_clause {
                fn encode(&self, writer: &mut ::cork::Writer) -> ::cork::Result<()> {
                    ::cork::Encoder::encode(&(), writer)
                }

                fn is_default(&self) -> bool {
                    true
                }
            }
        }),
    }
}

/// Derive macro for implementing the `Decoder` trait
///
/// Decoding merges: map keys with no matching field are skipped, fields the
/// stream does not mention keep their current value, and nil leaves the whole
/// value untouched. A fresh decode of a struct with named fields therefore
/// starts from `Default::default()`.
///
/// # Supported Attributes
///
/// * `#[cork("name")]` - Read the field from the `name` key
/// * `#[cork("-")]` - Never read the field
/// * `#[cork(corker)]` / `#[cork(selfer)]` on the type - Read it through its extension protocol
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Decode, Default)]
/// struct MyStruct {
///     #[cork("id")]
///     field1: i32,
///     #[cork("-")]
///     field2: String,
/// }
/// ```
#[proc_macro_derive(Decode, attributes(cork))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_decode(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_decode(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let mode = container_mode(&input.attrs)?;

    if mode != Mode::Fields {
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
        let call = match mode {
            Mode::Corker => quote! { ::cork::ext::decode_corker },
            _ => quote! { ::cork::ext::decode_selfer },
        };
        return Ok(quote! {
            impl #impl_generics ::cork::Decoder for #name #ty_generics #where_clause {
                fn decode(reader: &mut ::cork::Reader) -> ::cork::Result<Self> {
                    let mut value = <Self as ::core::default::Default>::default();
                    #call(&mut value, reader)?;
                    Ok(value)
                }

                fn decode_into(&mut self, reader: &mut ::cork::Reader) -> ::cork::Result<()> {
                    if reader.take_nil()? {
                        return Ok(());
                    }
                    #call(self, reader)
                }
            }
        });
    }

    let mut generics = add_bounds(&input.generics, quote!(::cork::Decoder));
    if matches!(&input.data, Data::Struct(s) if matches!(s.fields, Fields::Named(_))) {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(#name #ty_generics: ::core::default::Default));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Decode can only be derived for structs; implement cork::Decoder by hand for enums",
        ));
    };

    match &data.fields {
        Fields::Named(fields) => {
            let fields = named_fields(name, fields)?;
            let raw = raw_fields(&fields);
            let indices = 0..fields.len();
            let mut decode_arms = Vec::new();
            for (index, f) in izip!(indices, fields.iter()) {
                if f.skip {
                    continue;
                }
                let ident = f.ident;
                decode_arms.push(quote! {
                    #index => ::cork::Decoder::decode_into(&mut self.#ident, reader),
                });
            }
            Ok(quote! {
                impl #impl_generics ::cork::StructDecoder for #name #ty_generics #where_clause {
                    const FIELDS: &'static [::cork::fields::RawField] = #raw;

                    fn decode_field(&mut self, index: usize, reader: &mut ::cork::Reader) -> ::cork::Result<()> {
                        match index {
                            #(#decode_arms)*
                            _ => ::cork::skip_value(reader),
                        }
                    }
                }

                impl #impl_generics ::cork::Decoder for #name #ty_generics #where_clause {
                    fn decode(reader: &mut ::cork::Reader) -> ::cork::Result<Self> {
                        let mut value = <Self as ::core::default::Default>::default();
                        ::cork::fields::decode_struct(&mut value, reader)?;
                        Ok(value)
                    }

                    fn decode_into(&mut self, reader: &mut ::cork::Reader) -> ::cork::Result<()> {
                        ::cork::fields::decode_struct(self, reader)
                    }
                }
            })
        }
        Fields::Unnamed(fields) => {
            let count = fields.unnamed.len();
            let indices: Vec<syn::Index> = (0..count).map(syn::Index::from).collect();
            let types: Vec<&syn::Type> = fields.unnamed.iter().map(|f| &f.ty).collect();
            Ok(quote! {
                impl #impl_generics ::cork::Decoder for #name #ty_generics #where_clause {
                    fn decode(reader: &mut ::cork::Reader) -> ::cork::Result<Self> {
                        if !::cork::fields::decode_tuple_header(reader, #count)? {
                            return Err(::cork::CorkError::TypeMismatch {
                                expected: stringify!(#name),
                                found: ::cork::tags::NIL,
                            });
                        }
                        reader.nested(|reader| {
                            Ok(#name(#(<#types as ::cork::Decoder>::decode(reader)?),*))
                        })
                    }

                    fn decode_into(&mut self, reader: &mut ::cork::Reader) -> ::cork::Result<()> {
                        if !::cork::fields::decode_tuple_header(reader, #count)? {
                            return Ok(());
                        }
                        reader.nested(|reader| {
                            #(::cork::Decoder::decode_into(&mut self.#indices, reader)?;)*
                            Ok(())
                        })
                    }
                }
            })
        }
        Fields::Unit => Ok(quote! {
            impl #impl_generics ::cork::Decoder for #name #ty_generics #where_clause {
                fn decode(reader: &mut ::cork::Reader) -> ::cork::Result<Self> {
                    <() as ::cork::Decoder>::decode(reader)?;
                    Ok(#name)
                }
            }
        }),
    }
}
