use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Data, DeriveInput, Expr, Fields, Lit, Token};

/// Derive macro for entity type declarations.
///
/// Generates `TypedData` and `TypedRow` impls for the annotated struct:
///
/// - a static `EntitySchema` listing every `#[typed(...)]` field in
///   declaration order, under its camelCase property name;
/// - property access through `serde_json::to_value`;
/// - construction from a hydrated record through `tabula_api::entity::decode_property`.
///   Fields without `#[typed]`, and typed fields missing from the record,
///   take `Default::default()`.
///
/// # Example
///
/// ```ignore
/// #[derive(TypedData)]
/// pub struct User {
///     #[typed(uint64)]
///     pub user_id: u64,
///
///     #[typed(optional(utf8))]
///     pub display_name: Option<String>,
///
///     #[typed(list(utf8), name = "labels")]
///     pub tags: Vec<String>,
///
///     pub cached: bool,
/// }
/// ```
///
/// Type expressions: primitive names (`bool`, `int32`, `utf8`, `timestamp`,
/// ...), `optional(t)`, `list(t)`, `tuple(t, ...)`, `dict(k, v)`,
/// `structure(name = t, ...)`, `decimal(p, s)`, `variant(tuple(...))`.
#[proc_macro_derive(TypedData, attributes(typed))]
pub fn derive_typed_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

const PRIMITIVES: &[&str] = &[
    "bool",
    "int8",
    "uint8",
    "int16",
    "uint16",
    "int32",
    "uint32",
    "int64",
    "uint64",
    "float",
    "double",
    "string",
    "utf8",
    "yson",
    "json",
    "uuid",
    "date",
    "datetime",
    "timestamp",
    "interval",
    "tz_date",
    "tz_datetime",
    "tz_timestamp",
    "json_document",
    "dynumber",
];

struct TypedField {
    ident: syn::Ident,
    property: String,
    ty: TokenStream2,
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "TypedData does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "TypedData only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "TypedData only supports structs")),
    };

    let mut typed = Vec::new();
    let mut untyped = Vec::new();

    for field in fields {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("typed")) else {
            untyped.push(ident);
            continue;
        };

        let args = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;
        let mut rename: Option<String> = None;
        let mut ty: Option<TokenStream2> = None;

        for arg in &args {
            if let Expr::Assign(assign) = arg {
                if path_ident(&assign.left).as_deref() == Some("name") {
                    rename = Some(lit_str(&assign.right)?);
                    continue;
                }
            }
            if ty.is_some() {
                return Err(syn::Error::new_spanned(arg, "only one type expression per field"));
            }
            ty = Some(type_tokens(arg)?);
        }

        let ty = ty.ok_or_else(|| {
            syn::Error::new_spanned(attr, "missing type expression in #[typed(...)]")
        })?;
        let raw = ident.to_string();
        let property = rename.unwrap_or_else(|| camel_case(raw.trim_start_matches("r#")));

        if typed.iter().any(|t: &TypedField| t.property == property) {
            return Err(syn::Error::new_spanned(
                &ident,
                format!("duplicate property name '{property}'"),
            ));
        }
        typed.push(TypedField { ident, property, ty });
    }

    let schema_entries = typed.iter().map(|f| {
        let property = &f.property;
        let ty = &f.ty;
        quote! { .with_property(#property, #ty) }
    });

    let property_arms = typed.iter().map(|f| {
        let property = &f.property;
        let ident = &f.ident;
        quote! {
            #property => ::core::result::Result::Ok(::core::option::Option::Some(
                ::tabula_api::__private::serde_json::to_value(&self.#ident)?,
            )),
        }
    });

    let typed_inits = typed.iter().map(|f| {
        let property = &f.property;
        let ident = &f.ident;
        quote! {
            #ident: match __record.remove(#property) {
                ::core::option::Option::Some(__value) => {
                    ::tabula_api::entity::decode_property(__value).map_err(|e| {
                        e.with_context(::std::format!("property '{}'", #property))
                    })?
                }
                ::core::option::Option::None => ::core::default::Default::default(),
            },
        }
    });

    let untyped_inits = untyped.iter().map(|ident| {
        quote! { #ident: ::core::default::Default::default(), }
    });

    let expanded = quote! {
        impl ::tabula_api::entity::TypedData for #name {
            fn schema(&self) -> &::tabula_api::entity::EntitySchema {
                <Self as ::tabula_api::entity::TypedRow>::entity_schema()
            }

            fn property(
                &self,
                __name: &str,
            ) -> ::core::result::Result<
                ::core::option::Option<::tabula_api::__private::serde_json::Value>,
                ::tabula_api::error::MarshalError,
            > {
                match __name {
                    #(#property_arms)*
                    _ => ::core::result::Result::Ok(::core::option::Option::None),
                }
            }
        }

        impl ::tabula_api::entity::TypedRow for #name {
            fn entity_schema() -> &'static ::tabula_api::entity::EntitySchema {
                static SCHEMA: ::std::sync::OnceLock<::tabula_api::entity::EntitySchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    ::tabula_api::entity::EntitySchema::new(#name_str)
                        #(#schema_entries)*
                })
            }

            fn from_record(
                mut __record: ::tabula_api::entity::Record,
            ) -> ::core::result::Result<Self, ::tabula_api::error::MarshalError> {
                ::core::result::Result::Ok(Self {
                    #(#typed_inits)*
                    #(#untyped_inits)*
                })
            }
        }
    };

    Ok(expanded)
}

/// Translate a type expression into a `DeclaredType` constructor call.
fn type_tokens(expr: &Expr) -> Result<TokenStream2, syn::Error> {
    let ty = quote! { ::tabula_api::types::DeclaredType };

    if let Some(name) = path_ident(expr) {
        if !PRIMITIVES.contains(&name.as_str()) {
            return Err(syn::Error::new_spanned(
                expr,
                format!("unknown primitive type '{name}'"),
            ));
        }
        let id = syn::Ident::new(&name.to_uppercase(), proc_macro2::Span::call_site());
        return Ok(quote! { #ty::primitive(::tabula_api::types::PrimitiveTypeId::#id) });
    }

    let Expr::Call(call) = expr else {
        return Err(syn::Error::new_spanned(expr, "expected a type expression"));
    };
    let ctor = path_ident(&call.func)
        .ok_or_else(|| syn::Error::new_spanned(&call.func, "expected a type constructor"))?;
    let args: Vec<&Expr> = call.args.iter().collect();

    let arity = |n: usize| -> Result<(), syn::Error> {
        if args.len() == n {
            Ok(())
        } else {
            Err(syn::Error::new_spanned(
                call,
                format!("{ctor} takes {n} argument(s), got {}", args.len()),
            ))
        }
    };

    match ctor.as_str() {
        "optional" => {
            arity(1)?;
            let inner = type_tokens(args[0])?;
            Ok(quote! { #ty::optional(#inner) })
        }
        "list" => {
            arity(1)?;
            let item = type_tokens(args[0])?;
            Ok(quote! { #ty::list(#item) })
        }
        "tuple" => {
            let elements = args
                .iter()
                .map(|a| type_tokens(a))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(quote! { #ty::Tuple(::std::vec![#(#elements),*]) })
        }
        "dict" => {
            arity(2)?;
            let key = type_tokens(args[0])?;
            let payload = type_tokens(args[1])?;
            Ok(quote! { #ty::dict(#key, #payload) })
        }
        "structure" => {
            let mut members = Vec::new();
            for arg in &args {
                let Expr::Assign(assign) = arg else {
                    return Err(syn::Error::new_spanned(arg, "expected `member = type`"));
                };
                let member = path_ident(&assign.left)
                    .ok_or_else(|| syn::Error::new_spanned(&assign.left, "expected member name"))?;
                let member_ty = type_tokens(&assign.right)?;
                members.push(quote! {
                    ::tabula_api::types::StructMember {
                        name: ::std::string::String::from(#member),
                        ty: #member_ty,
                    }
                });
            }
            Ok(quote! { #ty::Struct(::std::vec![#(#members),*]) })
        }
        "decimal" => {
            arity(2)?;
            let precision = lit_u8(args[0])?;
            let scale = lit_u8(args[1])?;
            Ok(quote! { #ty::decimal(#precision, #scale) })
        }
        "variant" => {
            arity(1)?;
            let inner_ctor = match args[0] {
                Expr::Call(inner) => path_ident(&inner.func),
                _ => None,
            };
            if !matches!(inner_ctor.as_deref(), Some("tuple") | Some("structure")) {
                return Err(syn::Error::new_spanned(
                    args[0],
                    "variant must wrap tuple(...) or structure(...)",
                ));
            }
            let inner = type_tokens(args[0])?;
            Ok(quote! { #ty::variant(#inner) })
        }
        other => Err(syn::Error::new_spanned(
            &call.func,
            format!("unknown type constructor '{other}'"),
        )),
    }
}

/// Single-segment path expression as a string (`utf8`, `name`).
fn path_ident(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(p) if p.qself.is_none() => p.path.get_ident().map(|i| i.to_string()),
        _ => None,
    }
}

fn lit_str(expr: &Expr) -> Result<String, syn::Error> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Ok(s.value()),
            _ => Err(syn::Error::new_spanned(expr, "expected a string literal")),
        },
        _ => Err(syn::Error::new_spanned(expr, "expected a string literal")),
    }
}

fn lit_u8(expr: &Expr) -> Result<u8, syn::Error> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(i) => i.base10_parse(),
            _ => Err(syn::Error::new_spanned(expr, "expected an integer literal")),
        },
        _ => Err(syn::Error::new_spanned(expr, "expected an integer literal")),
    }
}

/// `user_id` -> `userId`. Same rule as `tabula_api::naming::to_camel`,
/// which this crate cannot depend on.
fn camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, segment) in ident.split('_').filter(|s| !s.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
