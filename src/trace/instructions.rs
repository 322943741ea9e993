// Copyright 2015-2019 Parity Technologies (UK) Ltd.
// This file is part of Parity Ethereum.

// Parity Ethereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity Ethereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity Ethereum.  If not, see <http://www.gnu.org/licenses/>.

//! Instruction mnemonics for trace output.

static PUSH_NAMES: [&'static str; 32] = [
	"PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8",
	"PUSH9", "PUSH10", "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16",
	"PUSH17", "PUSH18", "PUSH19", "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24",
	"PUSH25", "PUSH26", "PUSH27", "PUSH28", "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

static DUP_NAMES: [&'static str; 16] = [
	"DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8",
	"DUP9", "DUP10", "DUP11", "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

static SWAP_NAMES: [&'static str; 16] = [
	"SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8",
	"SWAP9", "SWAP10", "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

static LOG_NAMES: [&'static str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// The mnemonic of an instruction, or `"INVALID"` for unassigned opcodes.
pub fn name(instruction: u8) -> &'static str {
	match instruction {
		0x00 => "STOP",
		0x01 => "ADD",
		0x02 => "MUL",
		0x03 => "SUB",
		0x04 => "DIV",
		0x05 => "SDIV",
		0x06 => "MOD",
		0x07 => "SMOD",
		0x08 => "ADDMOD",
		0x09 => "MULMOD",
		0x0a => "EXP",
		0x0b => "SIGNEXTEND",
		0x10 => "LT",
		0x11 => "GT",
		0x12 => "SLT",
		0x13 => "SGT",
		0x14 => "EQ",
		0x15 => "ISZERO",
		0x16 => "AND",
		0x17 => "OR",
		0x18 => "XOR",
		0x19 => "NOT",
		0x1a => "BYTE",
		0x1b => "SHL",
		0x1c => "SHR",
		0x1d => "SAR",
		0x20 => "SHA3",
		0x30 => "ADDRESS",
		0x31 => "BALANCE",
		0x32 => "ORIGIN",
		0x33 => "CALLER",
		0x34 => "CALLVALUE",
		0x35 => "CALLDATALOAD",
		0x36 => "CALLDATASIZE",
		0x37 => "CALLDATACOPY",
		0x38 => "CODESIZE",
		0x39 => "CODECOPY",
		0x3a => "GASPRICE",
		0x3b => "EXTCODESIZE",
		0x3c => "EXTCODECOPY",
		0x3d => "RETURNDATASIZE",
		0x3e => "RETURNDATACOPY",
		0x40 => "BLOCKHASH",
		0x41 => "COINBASE",
		0x42 => "TIMESTAMP",
		0x43 => "NUMBER",
		0x44 => "DIFFICULTY",
		0x45 => "GASLIMIT",
		0x50 => "POP",
		0x51 => "MLOAD",
		0x52 => "MSTORE",
		0x53 => "MSTORE8",
		0x54 => "SLOAD",
		0x55 => "SSTORE",
		0x56 => "JUMP",
		0x57 => "JUMPI",
		0x58 => "PC",
		0x59 => "MSIZE",
		0x5a => "GAS",
		0x5b => "JUMPDEST",
		0x60..=0x7f => PUSH_NAMES[(instruction - 0x60) as usize],
		0x80..=0x8f => DUP_NAMES[(instruction - 0x80) as usize],
		0x90..=0x9f => SWAP_NAMES[(instruction - 0x90) as usize],
		0xa0..=0xa4 => LOG_NAMES[(instruction - 0xa0) as usize],
		0xf0 => "CREATE",
		0xf1 => "CALL",
		0xf2 => "CALLCODE",
		0xf3 => "RETURN",
		0xf4 => "DELEGATECALL",
		0xfa => "STATICCALL",
		0xfb => "CREATE2",
		0xfd => "REVERT",
		0xff => "SELFDESTRUCT",
		_ => "INVALID",
	}
}
