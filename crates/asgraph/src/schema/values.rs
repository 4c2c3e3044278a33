//! Scalar enumerations stored inside node fields and edge associations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a `u8`-coded enum with lookup helpers used by the binary codec.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $code ),+
        }

        impl $name {
            /// Every variant in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire code of this variant.
            pub fn code(self) -> u8 {
                self as u8
            }

            /// Look up a variant by wire code.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Variant name as written in dumps and logs.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

wire_enum! {
    /// Visibility of a member.
    AccessibilityKind {
        /// Visible everywhere
        #[default]
        Public = 0,
        /// Visible to subclasses
        Protected = 1,
        /// Visible to the declaring scope only
        Private = 2,
        /// Visible inside the declaring assembly/package
        Internal = 3,
        /// Protected or internal
        ProtectedInternal = 4,
    }
}

wire_enum! {
    /// Flavour of a class-like scope.
    ClassKind {
        /// Plain class
        #[default]
        Class = 0,
        /// Value struct
        Struct = 1,
        /// C/C++ union
        Union = 2,
        /// Interface or protocol
        Interface = 3,
        /// Enumeration
        Enum = 4,
        /// Java annotation type
        Annotation = 5,
    }
}

wire_enum! {
    /// Role of a method.
    MethodKind {
        /// Regular method
        #[default]
        Normal = 0,
        /// Constructor
        Constructor = 1,
        /// Destructor or finalizer
        Destructor = 2,
        /// Operator overload
        Operator = 3,
        /// Property getter
        Get = 4,
        /// Property setter
        Set = 5,
        /// Event add accessor
        Add = 6,
        /// Event remove accessor
        Remove = 7,
    }
}

wire_enum! {
    /// Flavour of a package-like scope.
    PackageKind {
        /// Java style package
        #[default]
        Package = 0,
        /// C++/C# namespace
        Namespace = 1,
        /// Module of a scripting language
        Module = 2,
        /// The synthetic root package
        Root = 3,
    }
}

wire_enum! {
    /// Passing convention of a parameter.
    ParameterKind {
        /// Passed by value
        #[default]
        In = 0,
        /// Output parameter
        Out = 1,
        /// Input and output
        InOut = 2,
        /// Passed by reference
        Ref = 3,
    }
}

wire_enum! {
    /// Indirection described by a pointer type former.
    PointerKind {
        /// `T*`
        #[default]
        Pointer = 0,
        /// `T&`
        Reference = 1,
        /// `T&&`
        RValueReference = 2,
    }
}

wire_enum! {
    /// Built-in types shared by all front ends.
    SimpleTypeKind {
        /// No value
        #[default]
        Void = 0,
        /// Boolean
        Boolean = 1,
        /// Character
        Character = 2,
        /// 8-bit integer
        Byte = 3,
        /// 16-bit integer
        Short = 4,
        /// 32-bit integer
        Int = 5,
        /// 64-bit integer
        Long = 6,
        /// Single precision float
        Float = 7,
        /// Double precision float
        Double = 8,
        /// Built-in string
        String = 9,
        /// Type not known to the front end
        Unknown = 10,
    }
}

wire_enum! {
    /// What a generic parameter stands for.
    GenericParameterKind {
        /// Type parameter
        #[default]
        Type = 0,
        /// Value parameter
        NonType = 1,
        /// Template template parameter
        Template = 2,
    }
}

wire_enum! {
    /// Source language of the analyzed program.
    Language {
        /// Not specified
        #[default]
        Other = 0,
        /// C
        C = 1,
        /// C++
        Cpp = 2,
        /// Java
        Java = 3,
        /// C#
        CSharp = 4,
        /// Python
        Python = 5,
        /// JavaScript
        JavaScript = 6,
        /// SQL dialects
        Sql = 7,
    }
}

impl Language {
    /// Separator between scope names when qualified names are rendered.
    pub fn scope_separator(self) -> &'static str {
        match self {
            Language::C | Language::Cpp => "::",
            _ => ".",
        }
    }

    /// What the language calls its package-like scopes.
    pub fn package_kind(self) -> PackageKind {
        match self {
            Language::Cpp | Language::CSharp => PackageKind::Namespace,
            Language::Python | Language::JavaScript => PackageKind::Module,
            _ => PackageKind::Package,
        }
    }
}
