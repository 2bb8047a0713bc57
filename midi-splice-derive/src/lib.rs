use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_error::{abort_call_site, proc_macro_error, ResultExt};
use quote::{quote, ToTokens};
use syn::{self, ext::IdentExt, Attribute, DataEnum, DataStruct, DeriveInput, Fields, Variant};

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|a| match a.path.get_ident() {
        None => false,
        Some(ident) => ident.unraw().to_string().eq(name),
    })
}

fn find_attr_fields<'a>(fields: &'a Fields, name: &str) -> Option<&'a Ident> {
    let fields = fields
        .iter()
        .filter(|f| has_attr(&f.attrs, name))
        .collect::<Vec<_>>();
    match fields.len() {
        0 => None,
        1 => fields[0].ident.as_ref(),
        _ => abort_call_site!(format!("Multiple fields found with attribute #[{name}]")),
    }
}

/// Implements `MIDIEvent` for an event struct, plus `KeyEvent`/`ChannelEvent` when a field is
/// tagged with `#[key]`/`#[channel]`.
#[proc_macro_derive(MIDIEvent, attributes(key, channel))]
#[proc_macro_error]
pub fn midi_event(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for MIDIEvent");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Struct(DataStruct { ref fields, .. }) = ast.data {
        let key_field = find_attr_fields(fields, "key");
        let channel_field = find_attr_fields(fields, "channel");

        if key_field.is_some() && channel_field.is_none() {
            abort_call_site!(
                "Key events must also have a channel (use #[channel] along with #[key])!"
            );
        }

        let mut generated_impl = Vec::new();
        let mut generated_trait_impl = Vec::new();
        let mut generated_traits = Vec::new();

        match key_field {
            None => {
                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn key(&self) -> Option<u8> {
                        None
                    }
                });
            }
            Some(ident) => {
                generated_impl.push(quote! {
                    #[inline(always)]
                    pub fn key(&self) -> u8 {
                        self.#ident
                    }
                });

                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn key(&self) -> Option<u8> {
                        Some(self.#ident)
                    }
                });

                generated_traits.push(quote! {
                    impl #impl_generics KeyEvent for #name #ty_generics #where_clause {
                        #[inline(always)]
                        fn key(&self) -> u8 {
                            self.#ident
                        }
                    }
                });
            }
        }

        match channel_field {
            None => {
                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn channel(&self) -> Option<u8> {
                        None
                    }
                });
            }
            Some(ident) => {
                generated_impl.push(quote! {
                    #[inline(always)]
                    pub fn channel(&self) -> u8 {
                        self.#ident
                    }
                });

                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn channel(&self) -> Option<u8> {
                        Some(self.#ident)
                    }
                });

                generated_traits.push(quote! {
                    impl #impl_generics ChannelEvent for #name #ty_generics #where_clause {
                        #[inline(always)]
                        fn channel(&self) -> u8 {
                            self.#ident
                        }
                    }
                });
            }
        }

        let gen = quote! {
            #(#generated_traits)*

            impl #impl_generics MIDIEvent for #name #ty_generics #where_clause {
                #(#generated_trait_impl)*
            }

            impl #impl_generics #name #ty_generics #where_clause {
                #(#generated_impl)*
            }
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(MIDIEvent)] is only defined for structs, not for enums!");
    }
}

fn event_enum_from_struct(name: &Ident) -> Ident {
    let event_name = name.unraw().to_string();
    let event_name = &event_name[..event_name.len() - 5];
    Ident::new(event_name, name.span())
}

fn event_struct_from_enum(name: &Ident) -> Ident {
    let event_name = name.unraw().to_string();
    let event_name = event_name + "Event";
    Ident::new(&event_name[..], name.span())
}

/// Generates `new` on the struct and the `Event::new_*` / `Event::new_delta_*` constructors.
#[proc_macro_derive(NewEvent)]
#[proc_macro_error]
pub fn create_new_event(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for NewEvent");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, _ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Struct(DataStruct { ref fields, .. }) = ast.data {
        let mut new_args = Vec::new();
        let mut assign = Vec::new();

        let event_ident = event_enum_from_struct(name);
        let snake_case = name.unraw().to_string()[..].to_case(Case::Snake);
        let new_ident = Ident::new(&format!("new_{snake_case}")[..], Span::call_site());
        let new_delta_ident = Ident::new(&format!("new_delta_{snake_case}")[..], Span::call_site());

        let doc_str = &format!("Creates a new `{name}`.");
        let doc_str2 = &format!(
            "Creates a new [`{name}`](crate::events::{name}) wrapped in [`Event::{ident}`](crate::events::Event::{ident}).",
            ident = event_ident.unraw(),
        );
        let doc_str2_delta = &format!(
            "Creates a new [`{name}`](crate::events::{name}) wrapped in [`Event::{ident}`](crate::events::Event::{ident}), paired with a delta time.",
            ident = event_ident.unraw(),
        );

        for field in fields.iter() {
            if let Some(ident) = &field.ident {
                let ty = &field.ty;
                new_args.push(quote! {#ident: #ty,});
                assign.push(quote! {#ident,});
            }
        }

        let gen = quote! {
            impl #impl_generics #name #where_clause {
                #[doc=#doc_str]
                #[inline(always)]
                pub fn new(#(#new_args)*) -> Self {
                    Self {
                        #(#assign)*
                    }
                }
            }

            impl Event {
                #[doc=#doc_str2]
                #[inline(always)]
                pub fn #new_ident(#(#new_args)*) -> Event {
                    (#name :: new(#(#assign)*)).as_event()
                }

                #[doc=#doc_str2_delta]
                #[inline(always)]
                pub fn #new_delta_ident<D: MIDINum>(delta: D, #(#new_args)*) -> Delta<D, Event> {
                    Delta::new(delta, (#name :: new(#(#assign)*)).as_event())
                }
            }
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(NewEvent)] is only defined for structs, not for enums!");
    }
}

/// Implements the dispatching traits on the `Event` enum.
///
/// Variants tagged `#[note]` report `is_note()`, variants tagged `#[meta]` report `is_meta()`.
#[proc_macro_derive(EventImpl, attributes(note, meta))]
#[proc_macro_error]
pub fn event_impl(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for EventImpl");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Enum(DataEnum { variants, .. }) = ast.data {
        fn is_boxed(variant: &Variant) -> bool {
            let field = match variant.fields.iter().next() {
                Some(field) => field,
                None => abort_call_site!("Event variants must wrap an event struct"),
            };
            let mut tokens = TokenStream2::new();
            field.ty.to_tokens(&mut tokens);
            tokens.to_string().starts_with("Box <")
        }

        fn match_all(lines: Vec<TokenStream2>) -> TokenStream2 {
            quote! {
                match self {
                    #(#lines)*
                }
            }
        }

        let variants = variants.iter().collect::<Vec<_>>();

        // Boxed variants are dereferenced so the call resolves on the event struct itself.
        let dispatch = |res: &dyn Fn(TokenStream2) -> TokenStream2| {
            match_all(
                variants
                    .iter()
                    .map(|v| {
                        let ident = &v.ident;
                        let inner = if is_boxed(v) {
                            quote! { &**event }
                        } else {
                            quote! { event }
                        };
                        let res = res(inner);
                        quote! { #name::#ident(event) => #res, }
                    })
                    .collect(),
            )
        };

        let flag = |attr: &str| {
            match_all(
                variants
                    .iter()
                    .map(|v| {
                        let ident = &v.ident;
                        let value = has_attr(&v.attrs, attr);
                        quote! { #name::#ident(_) => #value, }
                    })
                    .collect(),
            )
        };

        let key = dispatch(&|e| quote! { MIDIEvent::key(#e) });
        let channel = dispatch(&|e| quote! { MIDIEvent::channel(#e) });
        let serialize_event = dispatch(&|e| quote! { SerializeEvent::serialize_event(#e, buf) });
        let is_note = flag("note");
        let is_meta = flag("meta");

        let mut event_wrap_impl = Vec::new();
        for variant in variants.iter() {
            let ident = &variant.ident;
            let struct_ident = event_struct_from_enum(ident);
            let doc_str = &format!(
                "Wraps the `{}` in a `{}::{}`.",
                struct_ident.unraw(),
                name.unraw(),
                ident.unraw()
            );
            let wrapped = if is_boxed(variant) {
                quote! { #name::#ident(Box::new(self)) }
            } else {
                quote! { #name::#ident(self) }
            };
            event_wrap_impl.push(quote! {
                impl #struct_ident {
                    #[doc=#doc_str]
                    #[inline(always)]
                    pub fn as_event(self) -> #name #ty_generics {
                        #wrapped
                    }
                }

                impl From<#struct_ident> for #name #ty_generics {
                    #[inline(always)]
                    fn from(event: #struct_ident) -> Self {
                        event.as_event()
                    }
                }
            });
        }

        let gen = quote! {
            impl #impl_generics MIDIEvent for #name #ty_generics #where_clause {
                #[inline(always)]
                fn key(&self) -> Option<u8> {
                    #key
                }

                #[inline(always)]
                fn channel(&self) -> Option<u8> {
                    #channel
                }
            }

            impl #impl_generics #name #ty_generics #where_clause {
                /// Whether this is a note on or note off event.
                #[inline(always)]
                pub fn is_note(&self) -> bool {
                    #is_note
                }

                /// Whether this is a file/track level meta event.
                #[inline(always)]
                pub fn is_meta(&self) -> bool {
                    #is_meta
                }
            }

            #(#event_wrap_impl)*

            impl #impl_generics SerializeEvent for #name #ty_generics #where_clause {
                #[inline(always)]
                fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
                    #serialize_event
                }
            }
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(EventImpl)] is only defined for enums, not for structs!");
    }
}
