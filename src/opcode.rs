//! The primitive operations of the DSL virtual machine and their word encoding.
//!
//! The numeric codes and parameter counts in this module are the contract between the
//! assembler and the virtual machine's decoder. Changing either one is a breaking change for
//! every program image produced before it.

use std::fmt;

/// Comparison performed by [AluDoComparisonWithMode](OpCode::AluDoComparisonWithMode).
///
/// The mode is passed to the virtual machine as the operation's only parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareMode {
    /// Branch if the operands are equal. (`beq`)
    Equal,

    /// Branch if the operands differ. (`bne`)
    NotEqual,

    /// Branch if the first operand is greater than the second. (`bgt`)
    Greater,

    /// Branch if the first operand is greater than or equal to the second. (`bge`)
    GreaterOrEqual,

    /// Branch if the first operand is less than the second. (`blt`)
    Less,

    /// Branch if the first operand is less than or equal to the second. (`ble`)
    LessOrEqual,
}

impl CompareMode {
    /// Every comparison mode, ordered by its numeric value.
    pub const ALL: [CompareMode; 6] = [
        CompareMode::Equal,
        CompareMode::NotEqual,
        CompareMode::Greater,
        CompareMode::GreaterOrEqual,
        CompareMode::Less,
        CompareMode::LessOrEqual,
    ];

    pub fn as_word(self) -> i32 {
        match self {
            CompareMode::Equal => 0,
            CompareMode::NotEqual => 1,
            CompareMode::Greater => 2,
            CompareMode::GreaterOrEqual => 3,
            CompareMode::Less => 4,
            CompareMode::LessOrEqual => 5,
        }
    }

    /// The two letter condition used in branch mnemonics, eg. `eq` in `beq`.
    pub fn suffix(self) -> &'static str {
        match self {
            CompareMode::Equal => "eq",
            CompareMode::NotEqual => "ne",
            CompareMode::Greater => "gt",
            CompareMode::GreaterOrEqual => "ge",
            CompareMode::Less => "lt",
            CompareMode::LessOrEqual => "le",
        }
    }
}

/// Primitive operations of the DSL virtual machine.
///
/// Most operations read from or write to the _bus_, the single working register of the
/// machine. Binary ALU operations consume the value previously committed with
/// [AluPushFromBus](OpCode::AluPushFromBus) together with the current bus value and leave
/// their result in the ALU, from where it is copied back with [AluHiToBus](OpCode::AluHiToBus)
/// or [AluLoToBus](OpCode::AluLoToBus).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Does nothing besides advancing the instruction pointer.
    Noop,

    /// `memory[address] -> bus`
    LoadValueAtAddressIntoBus,

    /// `bus -> memory[address]`
    SaveValueInBusToLocation,

    /// `memory[here + offset] -> bus`
    LoadWithConstantOffsetFromHereToBus,

    /// `bus -> memory[here + offset]`
    SaveFromBusWithConstantOffsetFromHere,

    /// `memory[address + offset] -> bus`
    LoadWithConstantOffsetToBus,

    /// `bus -> memory[address + offset]`
    SaveFromBusWithConstantOffset,

    /// `memory[here + bus] -> bus`
    LoadWithBusAsConstantOffsetFromHere,

    /// `bus -> memory[here + bus]`
    SaveWithBusAsConstantOffsetFromHere,

    /// Adds the pushed value and the bus. The result is left in the high word.
    AluDoAdd,

    /// Multiplies the pushed value and the bus into a double width result.
    AluMultiply,

    /// Divides the pushed value by the bus. The quotient is left in the low word and the
    /// remainder in the high word.
    AluDivide,

    /// Continues execution at the address held by the bus.
    JumpWithBusValueRelative,

    /// Continues execution at the parameter if the latest comparison succeeded.
    BranchTo,

    /// Puts the address of this operation on the bus if the latest comparison succeeded.
    LinkIfBranched,

    AluHiToBus,
    AluLoToBus,
    AluToInt,
    AluToFloat,

    /// Allocates a new memory block and puts its start address on the bus.
    NewBlock,

    /// Calls the host with the parameter as the call code and the bus as the argument.
    Syscall,

    /// Suspends execution until the host resumes the machine.
    Pause,

    /// `parameter -> bus`
    LoadImmediateToBus,

    /// Commits the bus onto the ALU operand stack.
    AluPushFromBus,

    /// `memory[address + memory[offset_address]] -> bus`
    LoadWithVariableOffsetToBus,

    /// `bus -> memory[address + memory[offset_address]]`
    SaveFromBusWithVariableOffset,

    /// `instruction pointer -> bus`
    GetCurrentPosition,

    /// Compares the pushed value with the bus using the [CompareMode] given as parameter.
    AluDoComparisonWithMode,

    /// Stops the machine.
    Halt,
}

impl OpCode {
    /// The complete opcode table, ordered by numeric code.
    pub const ALL: [OpCode; 29] = [
        OpCode::Noop,
        OpCode::LoadValueAtAddressIntoBus,
        OpCode::SaveValueInBusToLocation,
        OpCode::LoadWithConstantOffsetFromHereToBus,
        OpCode::SaveFromBusWithConstantOffsetFromHere,
        OpCode::LoadWithConstantOffsetToBus,
        OpCode::SaveFromBusWithConstantOffset,
        OpCode::LoadWithBusAsConstantOffsetFromHere,
        OpCode::SaveWithBusAsConstantOffsetFromHere,
        OpCode::AluDoAdd,
        OpCode::AluMultiply,
        OpCode::AluDivide,
        OpCode::JumpWithBusValueRelative,
        OpCode::BranchTo,
        OpCode::LinkIfBranched,
        OpCode::AluHiToBus,
        OpCode::AluLoToBus,
        OpCode::AluToInt,
        OpCode::AluToFloat,
        OpCode::NewBlock,
        OpCode::Syscall,
        OpCode::Pause,
        OpCode::LoadImmediateToBus,
        OpCode::AluPushFromBus,
        OpCode::LoadWithVariableOffsetToBus,
        OpCode::SaveFromBusWithVariableOffset,
        OpCode::GetCurrentPosition,
        OpCode::AluDoComparisonWithMode,
        OpCode::Halt,
    ];

    pub fn as_word(self) -> i32 {
        match self {
            OpCode::Noop => 0,
            OpCode::LoadValueAtAddressIntoBus => 1,
            OpCode::SaveValueInBusToLocation => 2,
            OpCode::LoadWithConstantOffsetFromHereToBus => 3,
            OpCode::SaveFromBusWithConstantOffsetFromHere => 4,
            OpCode::LoadWithConstantOffsetToBus => 5,
            OpCode::SaveFromBusWithConstantOffset => 6,
            OpCode::LoadWithBusAsConstantOffsetFromHere => 7,
            OpCode::SaveWithBusAsConstantOffsetFromHere => 8,
            OpCode::AluDoAdd => 9,
            OpCode::AluMultiply => 11,
            OpCode::AluDivide => 12,
            OpCode::JumpWithBusValueRelative => 13,
            OpCode::BranchTo => 14,
            OpCode::LinkIfBranched => 15,
            OpCode::AluHiToBus => 16,
            OpCode::AluLoToBus => 17,
            OpCode::AluToInt => 18,
            OpCode::AluToFloat => 19,
            OpCode::NewBlock => 20,
            OpCode::Syscall => 21,
            OpCode::Pause => 23,
            OpCode::LoadImmediateToBus => 24,
            OpCode::AluPushFromBus => 25,
            OpCode::LoadWithVariableOffsetToBus => 26,
            OpCode::SaveFromBusWithVariableOffset => 27,
            OpCode::GetCurrentPosition => 28,
            OpCode::AluDoComparisonWithMode => 29,
            OpCode::Halt => 100,
        }
    }

    pub fn from_word(word: i32) -> Option<OpCode> {
        OpCode::ALL.iter().copied().find(|op| op.as_word() == word)
    }

    /// Number of parameter words following the opcode word.
    pub const fn arity(self) -> usize {
        match self {
            OpCode::LoadValueAtAddressIntoBus
            | OpCode::SaveValueInBusToLocation
            | OpCode::LoadWithConstantOffsetFromHereToBus
            | OpCode::SaveFromBusWithConstantOffsetFromHere
            | OpCode::BranchTo
            | OpCode::Syscall
            | OpCode::LoadImmediateToBus
            | OpCode::AluDoComparisonWithMode => 1,

            OpCode::LoadWithConstantOffsetToBus
            | OpCode::SaveFromBusWithConstantOffset
            | OpCode::LoadWithVariableOffsetToBus
            | OpCode::SaveFromBusWithVariableOffset => 2,

            _ => 0,
        }
    }

    /// Number of words the encoded operation occupies in memory.
    pub const fn size(self) -> usize {
        self.arity() + 1
    }

    /// Encodes the operation as `[code, params...]`.
    ///
    /// # Parameters
    /// - `params`: Exactly [arity](OpCode::arity) parameter words.
    pub fn encode(self, params: &[i32]) -> Vec<i32> {
        debug_assert_eq!(params.len(), self.arity(), "wrong parameter count for {}", self);

        let mut words = Vec::with_capacity(self.size());
        words.push(self.as_word());
        words.extend_from_slice(params);
        words
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Noop => "Noop",
            OpCode::LoadValueAtAddressIntoBus => "LoadValueAtAddressIntoBus",
            OpCode::SaveValueInBusToLocation => "SaveValueInBusToLocation",
            OpCode::LoadWithConstantOffsetFromHereToBus => "LoadWithConstantOffsetFromHereToBus",
            OpCode::SaveFromBusWithConstantOffsetFromHere => "SaveFromBusWithConstantOffsetFromHere",
            OpCode::LoadWithConstantOffsetToBus => "LoadWithConstantOffsetToBus",
            OpCode::SaveFromBusWithConstantOffset => "SaveFromBusWithConstantOffset",
            OpCode::LoadWithBusAsConstantOffsetFromHere => "LoadWithBusAsConstantOffsetFromHere",
            OpCode::SaveWithBusAsConstantOffsetFromHere => "SaveWithBusAsConstantOffsetFromHere",
            OpCode::AluDoAdd => "AluDoAdd",
            OpCode::AluMultiply => "AluMultiply",
            OpCode::AluDivide => "AluDivide",
            OpCode::JumpWithBusValueRelative => "JumpWithBusValueRelative",
            OpCode::BranchTo => "BranchTo",
            OpCode::LinkIfBranched => "LinkIfBranched",
            OpCode::AluHiToBus => "AluHiToBus",
            OpCode::AluLoToBus => "AluLoToBus",
            OpCode::AluToInt => "AluToInt",
            OpCode::AluToFloat => "AluToFloat",
            OpCode::NewBlock => "NewBlock",
            OpCode::Syscall => "Syscall",
            OpCode::Pause => "Pause",
            OpCode::LoadImmediateToBus => "LoadImmediateToBus",
            OpCode::AluPushFromBus => "AluPushFromBus",
            OpCode::LoadWithVariableOffsetToBus => "LoadWithVariableOffsetToBus",
            OpCode::SaveFromBusWithVariableOffset => "SaveFromBusWithVariableOffset",
            OpCode::GetCurrentPosition => "GetCurrentPosition",
            OpCode::AluDoComparisonWithMode => "AluDoComparisonWithMode",
            OpCode::Halt => "Halt",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_decode() {
        for op in OpCode::ALL.iter().copied() {
            assert_eq!(OpCode::from_word(op.as_word()), Some(op));
        }

        assert_eq!(OpCode::from_word(10), None);
        assert_eq!(OpCode::from_word(22), None);
    }

    #[test]
    fn encode_prepends_code() {
        assert_eq!(OpCode::Halt.encode(&[]), vec![100]);
        assert_eq!(OpCode::LoadImmediateToBus.encode(&[7]), vec![24, 7]);
        assert_eq!(OpCode::LoadWithVariableOffsetToBus.encode(&[3, 4]), vec![26, 3, 4]);
    }

    #[test]
    fn size_counts_parameters() {
        assert_eq!(OpCode::AluDoAdd.size(), 1);
        assert_eq!(OpCode::BranchTo.size(), 2);
        assert_eq!(OpCode::SaveFromBusWithConstantOffset.size(), 3);
    }
}
