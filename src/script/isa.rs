//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the VM's instruction set. The [`for_each_instruction!`](crate::for_each_instruction)
//! macro holds the canonical instruction definitions and invokes a callback
//! macro for code generation. This enables multiple modules to generate
//! instruction-related code without duplicating definitions.
//!
//! This module generates:
//! - The [`InstructionType`] enum with opcode/qualifier mappings
//! - [`InstructionType::from_parts`] for decoding
//! - Mnemonic and payload-layout accessors used by the decoder and tooling
//!
//! # Bytecode Format
//!
//! An instruction is identified by a two-byte pair:
//! - Opcode: 1 byte (the operation family)
//! - Qualifier: 1 byte (the operand types the operation applies to)
//!
//! The opcode-specific payload that follows is described by [`PayloadKind`]
//! and decoded big-endian by the [`ncs`](super::ncs) reader.

use crate::script::errors::ScriptError;

/// Operand payload layout that follows an instruction's opcode/qualifier pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PayloadKind {
    /// No payload.
    None,
    /// Signed stack offset (i32) plus copy size in bytes (u16).
    CopySize,
    /// Signed stack offset (i32).
    Adjust,
    /// Relative jump displacement (i32), resolved to an absolute target at
    /// decode time.
    Jump,
    /// Integer literal (i32).
    IntLit,
    /// Float literal (f32).
    FloatLit,
    /// Length-prefixed string literal (u16 + bytes).
    StrLit,
    /// Object id literal (i32).
    ObjLit,
    /// Routine index (u16) plus argument count (u8).
    Call,
    /// Destroyed size (u16), survivor offset (i16), survivor size (u16).
    Destruct,
    /// Captured globals size (u32) plus captured locals size (u32).
    StoreState,
    /// Structure size in bytes (u16).
    StructSize,
}

impl PayloadKind {
    /// Returns the encoded payload size in bytes, excluding the two-byte
    /// opcode/qualifier header. String literals add their character bytes on
    /// top of this.
    pub const fn encoded_size(&self) -> u32 {
        match self {
            PayloadKind::None => 0,
            PayloadKind::CopySize => 6,
            PayloadKind::Adjust => 4,
            PayloadKind::Jump => 4,
            PayloadKind::IntLit => 4,
            PayloadKind::FloatLit => 4,
            PayloadKind::StrLit => 2,
            PayloadKind::ObjLit => 4,
            PayloadKind::Call => 3,
            PayloadKind::Destruct => 6,
            PayloadKind::StoreState => 8,
            PayloadKind::StructSize => 2,
        }
    }
}

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each row is `Name = opcode, qualifier, "MNEMONIC" => PayloadKind`.
/// This macro enables code generation for instructions in multiple modules
/// without duplicating the instruction definitions.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// NOP ; no operation
            Nop = 0x00, 0x0c, "NOP" => None,
            /// CPDOWNSP offset, size ; assign size/4 cells from the top into SP+offset/4
            CpDownSp = 0x01, 0x01, "CPDOWNSP" => CopySize,
            /// RSADDI ; reserve one integer cell
            RsAddI = 0x02, 0x03, "RSADDI" => None,
            /// RSADDF ; reserve one float cell
            RsAddF = 0x02, 0x04, "RSADDF" => None,
            /// RSADDS ; reserve one string cell
            RsAddS = 0x02, 0x05, "RSADDS" => None,
            /// RSADDO ; reserve one object cell
            RsAddO = 0x02, 0x06, "RSADDO" => None,
            /// RSADDEFF ; reserve one effect cell
            RsAddEff = 0x02, 0x10, "RSADDEFF" => None,
            /// RSADDEVT ; reserve one event cell
            RsAddEvt = 0x02, 0x11, "RSADDEVT" => None,
            /// RSADDLOC ; reserve one location cell
            RsAddLoc = 0x02, 0x12, "RSADDLOC" => None,
            /// RSADDTAL ; reserve one talent cell
            RsAddTal = 0x02, 0x13, "RSADDTAL" => None,
            /// CPTOPSP offset, size ; push size/4 cells copied from SP+offset/4
            CpTopSp = 0x03, 0x01, "CPTOPSP" => CopySize,
            /// CONSTI value ; push integer constant
            ConstI = 0x04, 0x03, "CONSTI" => IntLit,
            /// CONSTF value ; push float constant
            ConstF = 0x04, 0x04, "CONSTF" => FloatLit,
            /// CONSTS value ; push string constant
            ConstS = 0x04, 0x05, "CONSTS" => StrLit,
            /// CONSTO id ; push object constant (id 0 resolves to the caller)
            ConstO = 0x04, 0x06, "CONSTO" => ObjLit,
            /// ACTION routine, argc ; invoke native routine
            Action = 0x05, 0x00, "ACTION" => Call,
            /// LOGANDII ; logical and of two integers
            LogAndII = 0x06, 0x20, "LOGANDII" => None,
            /// LOGORII ; logical or of two integers
            LogOrII = 0x07, 0x20, "LOGORII" => None,
            /// INCORII ; bitwise inclusive or of two integers
            IncOrII = 0x08, 0x20, "INCORII" => None,
            /// EXCORII ; bitwise exclusive or of two integers
            ExcOrII = 0x09, 0x20, "EXCORII" => None,
            /// BOOLANDII ; bitwise and of two integers
            BoolAndII = 0x0a, 0x20, "BOOLANDII" => None,
            /// EQUALII ; integer equality
            EqualII = 0x0b, 0x20, "EQUALII" => None,
            /// EQUALFF ; float equality within tolerance
            EqualFF = 0x0b, 0x21, "EQUALFF" => None,
            /// EQUALOO ; object identity equality
            EqualOO = 0x0b, 0x22, "EQUALOO" => None,
            /// EQUALSS ; string equality
            EqualSS = 0x0b, 0x23, "EQUALSS" => None,
            /// EQUALTT size ; structure equality over size/4 cells
            EqualTT = 0x0b, 0x24, "EQUALTT" => StructSize,
            /// EQUALEFFEFF ; effect handle equality
            EqualEffEff = 0x0b, 0x30, "EQUALEFFEFF" => None,
            /// EQUALEVTEVT ; event handle equality
            EqualEvtEvt = 0x0b, 0x31, "EQUALEVTEVT" => None,
            /// EQUALLOCLOC ; location handle equality
            EqualLocLoc = 0x0b, 0x32, "EQUALLOCLOC" => None,
            /// EQUALTALTAL ; talent handle equality
            EqualTalTal = 0x0b, 0x33, "EQUALTALTAL" => None,
            /// NEQUALII ; integer inequality
            NequalII = 0x0c, 0x20, "NEQUALII" => None,
            /// NEQUALFF ; float inequality
            NequalFF = 0x0c, 0x21, "NEQUALFF" => None,
            /// NEQUALOO ; object identity inequality
            NequalOO = 0x0c, 0x22, "NEQUALOO" => None,
            /// NEQUALSS ; string inequality
            NequalSS = 0x0c, 0x23, "NEQUALSS" => None,
            /// NEQUALTT size ; structure inequality over size/4 cells
            NequalTT = 0x0c, 0x24, "NEQUALTT" => StructSize,
            /// NEQUALEFFEFF ; effect handle inequality
            NequalEffEff = 0x0c, 0x30, "NEQUALEFFEFF" => None,
            /// NEQUALEVTEVT ; event handle inequality
            NequalEvtEvt = 0x0c, 0x31, "NEQUALEVTEVT" => None,
            /// NEQUALLOCLOC ; location handle inequality
            NequalLocLoc = 0x0c, 0x32, "NEQUALLOCLOC" => None,
            /// NEQUALTALTAL ; talent handle inequality
            NequalTalTal = 0x0c, 0x33, "NEQUALTALTAL" => None,
            /// GEQII ; integer greater-or-equal
            GeqII = 0x0d, 0x20, "GEQII" => None,
            /// GEQFF ; float greater-or-equal
            GeqFF = 0x0d, 0x21, "GEQFF" => None,
            /// GTII ; integer greater-than
            GtII = 0x0e, 0x20, "GTII" => None,
            /// GTFF ; float greater-than
            GtFF = 0x0e, 0x21, "GTFF" => None,
            /// LTII ; integer less-than
            LtII = 0x0f, 0x20, "LTII" => None,
            /// LTFF ; float less-than
            LtFF = 0x0f, 0x21, "LTFF" => None,
            /// LEQII ; integer less-or-equal
            LeqII = 0x10, 0x20, "LEQII" => None,
            /// LEQFF ; float less-or-equal
            LeqFF = 0x10, 0x21, "LEQFF" => None,
            /// SHLEFTII ; shift left
            ShLeftII = 0x11, 0x20, "SHLEFTII" => None,
            /// SHRIGHTII ; sign-preserving shift right
            ShRightII = 0x12, 0x20, "SHRIGHTII" => None,
            /// USHRIGHTII ; unsigned shift right (currently a signed shift)
            UShRightII = 0x13, 0x20, "USHRIGHTII" => None,
            /// ADDII ; integer addition
            AddII = 0x14, 0x20, "ADDII" => None,
            /// ADDIF ; int + float -> float
            AddIF = 0x14, 0x25, "ADDIF" => None,
            /// ADDFI ; float + int -> float
            AddFI = 0x14, 0x26, "ADDFI" => None,
            /// ADDFF ; float addition
            AddFF = 0x14, 0x21, "ADDFF" => None,
            /// ADDSS ; string concatenation
            AddSS = 0x14, 0x23, "ADDSS" => None,
            /// ADDVV ; vector addition
            AddVV = 0x14, 0x3a, "ADDVV" => None,
            /// SUBII ; integer subtraction
            SubII = 0x15, 0x20, "SUBII" => None,
            /// SUBIF ; int - float -> float
            SubIF = 0x15, 0x25, "SUBIF" => None,
            /// SUBFI ; float - int -> float
            SubFI = 0x15, 0x26, "SUBFI" => None,
            /// SUBFF ; float subtraction
            SubFF = 0x15, 0x21, "SUBFF" => None,
            /// SUBVV ; vector subtraction
            SubVV = 0x15, 0x3a, "SUBVV" => None,
            /// MULII ; integer multiplication
            MulII = 0x16, 0x20, "MULII" => None,
            /// MULIF ; int * float -> float
            MulIF = 0x16, 0x25, "MULIF" => None,
            /// MULFI ; float * int -> float
            MulFI = 0x16, 0x26, "MULFI" => None,
            /// MULFF ; float multiplication
            MulFF = 0x16, 0x21, "MULFF" => None,
            /// MULVF ; vector scaled by float
            MulVF = 0x16, 0x3b, "MULVF" => None,
            /// MULFV ; float scaled by vector
            MulFV = 0x16, 0x3c, "MULFV" => None,
            /// DIVII ; integer division
            DivII = 0x17, 0x20, "DIVII" => None,
            /// DIVIF ; int / float -> float
            DivIF = 0x17, 0x25, "DIVIF" => None,
            /// DIVFI ; float / int -> float
            DivFI = 0x17, 0x26, "DIVFI" => None,
            /// DIVFF ; float division
            DivFF = 0x17, 0x21, "DIVFF" => None,
            /// DIVVF ; vector divided by float
            DivVF = 0x17, 0x3b, "DIVVF" => None,
            /// DIVFV ; float divided componentwise by vector
            DivFV = 0x17, 0x3c, "DIVFV" => None,
            /// MODII ; integer modulo
            ModII = 0x18, 0x20, "MODII" => None,
            /// NEGI ; negate integer in place
            NegI = 0x19, 0x03, "NEGI" => None,
            /// NEGF ; negate float in place
            NegF = 0x19, 0x04, "NEGF" => None,
            /// COMPI ; one's complement (decoded, no handler)
            CompI = 0x1a, 0x03, "COMPI" => None,
            /// MOVSP offset ; pop -offset/4 cells
            MovSp = 0x1b, 0x00, "MOVSP" => Adjust,
            /// JMP target ; unconditional jump
            Jmp = 0x1d, 0x00, "JMP" => Jump,
            /// JSR target ; jump to subroutine, pushing the return offset
            Jsr = 0x1e, 0x00, "JSR" => Jump,
            /// JZ target ; jump if popped integer is zero
            Jz = 0x1f, 0x00, "JZ" => Jump,
            /// RETN ; return to the pushed offset, or terminate
            Retn = 0x20, 0x00, "RETN" => None,
            /// DESTRUCT size, offset, sizeNoDestroy ; scope teardown keeping survivors
            Destruct = 0x21, 0x01, "DESTRUCT" => Destruct,
            /// NOTI ; logical not of one integer
            NotI = 0x22, 0x03, "NOTI" => None,
            /// DECISP offset ; decrement integer at SP+offset/4
            DecISp = 0x23, 0x03, "DECISP" => Adjust,
            /// INCISP offset ; increment integer at SP+offset/4
            IncISp = 0x24, 0x03, "INCISP" => Adjust,
            /// JNZ target ; jump if popped integer is non-zero
            Jnz = 0x25, 0x00, "JNZ" => Jump,
            /// CPDOWNBP offset, size ; assign size/4 cells from the top into BP+offset/4
            CpDownBp = 0x26, 0x01, "CPDOWNBP" => CopySize,
            /// CPTOPBP offset, size ; push size/4 cells copied from BP+offset/4
            CpTopBp = 0x27, 0x01, "CPTOPBP" => CopySize,
            /// DECIBP offset ; decrement integer at BP+offset/4
            DecIBp = 0x28, 0x03, "DECIBP" => Adjust,
            /// INCIBP offset ; increment integer at BP+offset/4
            IncIBp = 0x29, 0x03, "INCIBP" => Adjust,
            /// SAVEBP ; set BP to the stack size, push the old size
            SaveBp = 0x2a, 0x00, "SAVEBP" => None,
            /// RESTOREBP ; pop an integer and restore BP from it
            RestoreBp = 0x2b, 0x00, "RESTOREBP" => None,
            /// STORE_STATE size, sizeLocals ; capture globals/locals for deferred resume
            StoreState = 0x2c, 0x10, "STORE_STATE" => StoreState,
            /// NOP2 ; no operation
            Nop2 = 0x2d, 0x00, "NOP2" => None,
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $code:literal, $qual:literal, $mnemonic:literal => $payload:ident
        ),* $(,)?
    ) => {
        /// Decoded instruction identity: one opcode/qualifier pair.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum InstructionType {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl InstructionType {
            /// All instruction types, in definition order.
            pub const ALL: &'static [InstructionType] = &[
                $( InstructionType::$name, )*
            ];

            /// Decodes an opcode/qualifier pair, or `None` for unknown pairs.
            pub fn from_parts(bytecode: u8, qualifier: u8) -> Option<Self> {
                match (bytecode, qualifier) {
                    $( ($code, $qual) => Some(InstructionType::$name), )*
                    _ => None,
                }
            }

            /// Returns the mnemonic used by disassembly and error messages.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( InstructionType::$name => $mnemonic, )*
                }
            }

            /// Returns the opcode byte.
            pub const fn bytecode(&self) -> u8 {
                match self {
                    $( InstructionType::$name => $code, )*
                }
            }

            /// Returns the type qualifier byte.
            pub const fn qualifier(&self) -> u8 {
                match self {
                    $( InstructionType::$name => $qual, )*
                }
            }

            /// Returns the payload layout following the opcode/qualifier pair.
            pub const fn payload_kind(&self) -> PayloadKind {
                match self {
                    $( InstructionType::$name => PayloadKind::$payload, )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl InstructionType {
    /// Decodes an opcode/qualifier pair, failing with load-time context.
    pub fn decode(bytecode: u8, qualifier: u8, offset: u32) -> Result<Self, ScriptError> {
        Self::from_parts(bytecode, qualifier).ok_or(ScriptError::InvalidInstruction {
            bytecode,
            qualifier,
            offset,
        })
    }
}
