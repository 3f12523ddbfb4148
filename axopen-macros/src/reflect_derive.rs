use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{parse_quote, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Token, UnOp};

use crate::crate_path::openapi_path;
use crate::rename_rule::RenameRule;

/// Container-level settings from `#[reflect(...)]` and `#[serde(...)]`.
#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
    inline: bool,
    rename_all: Option<RenameRule>,
}

/// Field-level settings collected from `#[serde]`, `#[reflect]`, `#[garde]`
/// and doc comments.
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    query: Option<String>,
    path: Option<String>,
    form: Option<String>,
    omit_empty: bool,
    embedded: bool,
    skip: bool,
    description: Option<String>,
    default: Option<String>,
    enum_values: Option<String>,
    example: Option<String>,
    validate: Option<String>,
    nullable: bool,
    doc: Vec<String>,
    garde_rules: Vec<String>,
}

pub fn expand(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_inner(input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_inner(input: DeriveInput) -> syn::Result<TokenStream> {
    let krate = openapi_path();
    let name = &input.ident;
    let container = parse_container_attrs(&input.attrs)?;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(#krate::Reflect));
    }
    let is_generic = input.generics.type_params().next().is_some();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => {
            let fields = match &data.fields {
                Fields::Named(f) => &f.named,
                _ => {
                    return Err(syn::Error::new_spanned(
                        name,
                        "Reflect can only be derived for structs with named fields",
                    ))
                }
            };

            let mut defs = Vec::new();
            for field in fields {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let attrs = parse_field_attrs(&field.attrs)?;
                if attrs.skip {
                    continue;
                }
                defs.push(field_def(&krate, ident, &field.ty, attrs, container.rename_all));
            }

            // Generic structs have one Rust name for many instantiations, so
            // they are inlined unless given an explicit component name.
            let component = match (&container.name, container.inline, is_generic) {
                (_, true, _) => None,
                (Some(explicit), false, _) => Some(explicit.clone()),
                (None, false, true) => None,
                (None, false, false) => Some(name.to_string()),
            };

            match component {
                Some(component) => quote! {
                    #krate::Shape::record::<Self>(#component, ::std::vec![ #(#defs),* ])
                },
                None => quote! {
                    #krate::Shape::inline_record::<Self>(::std::vec![ #(#defs),* ])
                },
            }
        }
        Data::Enum(data) => {
            let mut variants = Vec::new();
            for variant in &data.variants {
                if !matches!(variant.fields, Fields::Unit) {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "Reflect can only be derived for enums whose variants carry no data",
                    ));
                }
                let attrs = parse_field_attrs(&variant.attrs)?;
                if attrs.skip {
                    continue;
                }
                let ident = variant.ident.to_string();
                let value = attrs.rename.unwrap_or_else(|| match container.rename_all {
                    Some(rule) => rule.apply_to_variant(&ident),
                    None => ident,
                });
                variants.push(value);
            }
            quote! {
                #krate::Shape::new::<Self>(#krate::Kind::Enum(::std::vec![ #(#variants),* ]))
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Reflect can only be derived for structs and enums",
            ))
        }
    };

    Ok(quote! {
        impl #impl_generics #krate::Reflect for #name #ty_generics #where_clause {
            fn shape() -> #krate::Shape {
                #body
            }
        }
    })
}

fn field_def(
    krate: &TokenStream,
    ident: &syn::Ident,
    ty: &syn::Type,
    attrs: FieldAttrs,
    rename_all: Option<RenameRule>,
) -> TokenStream {
    let ident_str = ident.to_string();
    let ident_str = ident_str.strip_prefix("r#").unwrap_or(&ident_str).to_string();

    let json_name = match attrs.rename {
        Some(rename) => rename,
        None => match rename_all {
            Some(rule) => rule.apply_to_field(&ident_str),
            None => ident_str.clone(),
        },
    };

    let mut def = quote!(#krate::FieldDef::of::<#ty>(#ident_str));
    if json_name != ident_str {
        def = quote!(#def.rename(#json_name));
    }
    if let Some(query) = attrs.query {
        def = quote!(#def.query(#query));
    }
    if let Some(path) = attrs.path {
        def = quote!(#def.path(#path));
    }
    if let Some(form) = attrs.form {
        def = quote!(#def.form(#form));
    }
    if attrs.omit_empty {
        def = quote!(#def.omit_empty());
    }
    if attrs.embedded {
        def = quote!(#def.embedded());
    }

    let description = attrs.description.or_else(|| {
        let doc = attrs.doc.join("\n");
        let doc = doc.trim();
        (!doc.is_empty()).then(|| doc.to_string())
    });
    if let Some(description) = description {
        def = quote!(#def.description(#description));
    }
    if let Some(default) = attrs.default {
        def = quote!(#def.default_value(#default));
    }
    if let Some(values) = attrs.enum_values {
        def = quote!(#def.enum_values(#values));
    }
    if let Some(example) = attrs.example {
        def = quote!(#def.example(#example));
    }

    // An explicit rule string wins over the rules read from `#[garde]`.
    let validate = attrs.validate.or_else(|| {
        (!attrs.garde_rules.is_empty()).then(|| attrs.garde_rules.join(","))
    });
    if let Some(validate) = validate {
        def = quote!(#def.validate(#validate));
    }
    if attrs.nullable {
        def = quote!(#def.nullable());
    }
    def
}

// ── Attribute parsing ────────────────────────────────────────────────────────

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("reflect") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") || meta.path.is_ident("rename") {
                    out.name = Some(lit_str(&meta)?);
                } else if meta.path.is_ident("inline") {
                    out.inline = true;
                } else if meta.path.is_ident("rename_all") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename_all = Some(rename_rule(&lit)?);
                } else {
                    return Err(meta.error("unsupported reflect container attribute"));
                }
                Ok(())
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    if meta.input.peek(Token![=]) {
                        let lit: LitStr = meta.value()?.parse()?;
                        out.rename_all = out.rename_all.or(Some(rename_rule(&lit)?));
                    } else {
                        meta.parse_nested_meta(|inner| {
                            let lit: LitStr = inner.value()?.parse()?;
                            if inner.path.is_ident("deserialize") {
                                out.rename_all = out.rename_all.or(Some(rename_rule(&lit)?));
                            }
                            Ok(())
                        })?;
                    }
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }
    }

    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let syn::Meta::NameValue(nv) = &attr.meta {
                if let Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) = &nv.value {
                    out.doc.push(s.value().trim().to_string());
                }
            }
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| parse_serde_field(&meta, &mut out))?;
        } else if attr.path().is_ident("reflect") {
            attr.parse_nested_meta(|meta| parse_reflect_field(&meta, &mut out))?;
        } else if attr.path().is_ident("garde") {
            attr.parse_nested_meta(|meta| parse_garde_field(&meta, &mut out))?;
        }
    }

    Ok(out)
}

fn parse_serde_field(meta: &ParseNestedMeta, out: &mut FieldAttrs) -> syn::Result<()> {
    if meta.path.is_ident("rename") {
        if meta.input.peek(Token![=]) {
            out.rename = out.rename.take().or(Some(lit_str(meta)?));
        } else {
            meta.parse_nested_meta(|inner| {
                let lit: LitStr = inner.value()?.parse()?;
                if inner.path.is_ident("deserialize") {
                    out.rename = Some(lit.value());
                }
                Ok(())
            })?;
        }
    } else if meta.path.is_ident("skip") {
        out.skip = true;
    } else if meta.path.is_ident("flatten") {
        out.embedded = true;
    } else if meta.path.is_ident("skip_serializing_if") || meta.path.is_ident("default") {
        out.omit_empty = true;
        skip_meta(meta)?;
    } else {
        skip_meta(meta)?;
    }
    Ok(())
}

fn parse_reflect_field(meta: &ParseNestedMeta, out: &mut FieldAttrs) -> syn::Result<()> {
    let path = &meta.path;
    if path.is_ident("rename") {
        out.rename = Some(lit_str(meta)?);
    } else if path.is_ident("query") {
        out.query = Some(lit_str(meta)?);
    } else if path.is_ident("path") {
        out.path = Some(lit_str(meta)?);
    } else if path.is_ident("form") {
        out.form = Some(lit_str(meta)?);
    } else if path.is_ident("omit_empty") {
        out.omit_empty = true;
    } else if path.is_ident("embed") {
        out.embedded = true;
    } else if path.is_ident("skip") {
        out.skip = true;
    } else if path.is_ident("description") {
        out.description = Some(lit_str(meta)?);
    } else if path.is_ident("default") {
        out.default = Some(lit_str(meta)?);
    } else if path.is_ident("enum_values") {
        out.enum_values = Some(lit_str(meta)?);
    } else if path.is_ident("example") {
        out.example = Some(lit_str(meta)?);
    } else if path.is_ident("validate") {
        out.validate = Some(lit_str(meta)?);
    } else if path.is_ident("nullable") {
        out.nullable = true;
    } else {
        return Err(meta.error("unsupported reflect field attribute"));
    }
    Ok(())
}

/// Read the `length` and `range` bounds of a `#[garde(...)]` attribute so the
/// documented constraints follow the runtime ones. Other rules are skipped.
fn parse_garde_field(meta: &ParseNestedMeta, out: &mut FieldAttrs) -> syn::Result<()> {
    if meta.path.is_ident("length") || meta.path.is_ident("range") {
        if !meta.input.peek(syn::token::Paren) {
            return skip_meta(meta);
        }
        meta.parse_nested_meta(|bound| {
            let key = if bound.path.is_ident("min") {
                Some("min")
            } else if bound.path.is_ident("max") {
                Some("max")
            } else if bound.path.is_ident("equal") {
                Some("equal")
            } else {
                None
            };

            if !bound.input.peek(Token![=]) {
                return Ok(());
            }
            let value: Expr = bound.value()?.parse()?;
            match (key, numeric_literal(&value)) {
                (Some("equal"), Some(n)) => {
                    out.garde_rules.push(format!("min={n}"));
                    out.garde_rules.push(format!("max={n}"));
                }
                (Some(key), Some(n)) => out.garde_rules.push(format!("{key}={n}")),
                _ => {}
            }
            Ok(())
        })?;
    } else {
        skip_meta(meta)?;
    }
    Ok(())
}

/// Consume whatever follows a meta item we do not interpret.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _: proc_macro2::Group = meta.input.parse()?;
    }
    Ok(())
}

fn lit_str(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn rename_rule(lit: &LitStr) -> syn::Result<RenameRule> {
    RenameRule::from_str(&lit.value())
        .ok_or_else(|| syn::Error::new_spanned(lit, "unknown rename_all rule"))
}

fn numeric_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => Some(i.base10_digits().to_string()),
        Expr::Lit(ExprLit { lit: Lit::Float(f), .. }) => Some(f.base10_digits().to_string()),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            numeric_literal(&unary.expr).map(|n| format!("-{n}"))
        }
        Expr::Group(group) => numeric_literal(&group.expr),
        _ => None,
    }
}
