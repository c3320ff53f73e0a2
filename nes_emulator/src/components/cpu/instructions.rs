//! Implements the 6502 instruction set of the 2A03.
//!
//! One function per instruction, each named after the mnemonic. The bus cycles of an
//! instruction are driven by the address mode in [super::Cpu::step], these functions only
//! implement the data operation. They are grouped by the kind of operation as listed in
//! [super::opcode_table::Operation].
//!
//! The 2A03 has no decimal mode. The D flag can be set and cleared but ADC and SBC ignore it.
use intbits::Bits;

use super::Cpu;

// Implied operations

pub fn nop(_: &mut Cpu) {}

pub fn clc(cpu: &mut Cpu) {
    cpu.status.carry = false;
}

pub fn cld(cpu: &mut Cpu) {
    cpu.status.decimal = false;
}

pub fn cli(cpu: &mut Cpu) {
    cpu.status.irq_disable = false;
}

pub fn clv(cpu: &mut Cpu) {
    cpu.status.overflow = false;
}

pub fn sec(cpu: &mut Cpu) {
    cpu.status.carry = true;
}

pub fn sed(cpu: &mut Cpu) {
    cpu.status.decimal = true;
}

pub fn sei(cpu: &mut Cpu) {
    cpu.status.irq_disable = true;
}

pub fn tax(cpu: &mut Cpu) {
    cpu.x = cpu.a;
    cpu.update_negative_zero_flags(cpu.x);
}

pub fn tay(cpu: &mut Cpu) {
    cpu.y = cpu.a;
    cpu.update_negative_zero_flags(cpu.y);
}

pub fn txa(cpu: &mut Cpu) {
    cpu.a = cpu.x;
    cpu.update_negative_zero_flags(cpu.a);
}

pub fn tya(cpu: &mut Cpu) {
    cpu.a = cpu.y;
    cpu.update_negative_zero_flags(cpu.a);
}

pub fn tsx(cpu: &mut Cpu) {
    cpu.x = cpu.s;
    cpu.update_negative_zero_flags(cpu.x);
}

pub fn txs(cpu: &mut Cpu) {
    cpu.s = cpu.x;
}

pub fn inx(cpu: &mut Cpu) {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.update_negative_zero_flags(cpu.x);
}

pub fn iny(cpu: &mut Cpu) {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.update_negative_zero_flags(cpu.y);
}

pub fn dex(cpu: &mut Cpu) {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.update_negative_zero_flags(cpu.x);
}

pub fn dey(cpu: &mut Cpu) {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.update_negative_zero_flags(cpu.y);
}

// Read operations

pub fn lda(cpu: &mut Cpu, value: u8) {
    cpu.a = value;
    cpu.update_negative_zero_flags(value);
}

pub fn ldx(cpu: &mut Cpu, value: u8) {
    cpu.x = value;
    cpu.update_negative_zero_flags(value);
}

pub fn ldy(cpu: &mut Cpu, value: u8) {
    cpu.y = value;
    cpu.update_negative_zero_flags(value);
}

pub fn lax(cpu: &mut Cpu, value: u8) {
    cpu.a = value;
    cpu.x = value;
    cpu.update_negative_zero_flags(value);
}

pub fn and(cpu: &mut Cpu, value: u8) {
    cpu.a &= value;
    cpu.update_negative_zero_flags(cpu.a);
}

pub fn ora(cpu: &mut Cpu, value: u8) {
    cpu.a |= value;
    cpu.update_negative_zero_flags(cpu.a);
}

pub fn eor(cpu: &mut Cpu, value: u8) {
    cpu.a ^= value;
    cpu.update_negative_zero_flags(cpu.a);
}

pub fn adc(cpu: &mut Cpu, value: u8) {
    let sum = cpu.a as u16 + value as u16 + cpu.status.carry as u16;
    let result = sum as u8;
    cpu.status.overflow = (!(cpu.a ^ value) & (cpu.a ^ result)).bit(7);
    cpu.status.carry = sum > 0xFF;
    cpu.a = result;
    cpu.update_negative_zero_flags(result);
}

pub fn sbc(cpu: &mut Cpu, value: u8) {
    adc(cpu, !value);
}

pub fn cmp(cpu: &mut Cpu, value: u8) {
    cpu.compare(cpu.a, value);
}

pub fn cpx(cpu: &mut Cpu, value: u8) {
    cpu.compare(cpu.x, value);
}

pub fn cpy(cpu: &mut Cpu, value: u8) {
    cpu.compare(cpu.y, value);
}

pub fn bit(cpu: &mut Cpu, value: u8) {
    cpu.status.zero = cpu.a & value == 0;
    cpu.status.negative = value.bit(7);
    cpu.status.overflow = value.bit(6);
}

/// Unofficial NOPs with an operand. They perform the read, including the page cross penalty.
pub fn ign(_: &mut Cpu, _: u8) {}

// Write operations

pub fn sta(cpu: &Cpu) -> u8 {
    cpu.a
}

pub fn stx(cpu: &Cpu) -> u8 {
    cpu.x
}

pub fn sty(cpu: &Cpu) -> u8 {
    cpu.y
}

pub fn sax(cpu: &Cpu) -> u8 {
    cpu.a & cpu.x
}

// Read-modify-write operations

pub fn asl(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value << 1;
    cpu.status.carry = value.bit(7);
    cpu.update_negative_zero_flags(result);
    result
}

pub fn lsr(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value >> 1;
    cpu.status.carry = value.bit(0);
    cpu.update_negative_zero_flags(result);
    result
}

pub fn rol(cpu: &mut Cpu, value: u8) -> u8 {
    let result = (value << 1) | cpu.status.carry as u8;
    cpu.status.carry = value.bit(7);
    cpu.update_negative_zero_flags(result);
    result
}

pub fn ror(cpu: &mut Cpu, value: u8) -> u8 {
    let result = (value >> 1) | ((cpu.status.carry as u8) << 7);
    cpu.status.carry = value.bit(0);
    cpu.update_negative_zero_flags(result);
    result
}

pub fn inc(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    cpu.update_negative_zero_flags(result);
    result
}

pub fn dec(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    cpu.update_negative_zero_flags(result);
    result
}

/// ASL + ORA
pub fn slo(cpu: &mut Cpu, value: u8) -> u8 {
    let result = asl(cpu, value);
    ora(cpu, result);
    result
}

/// ROL + AND
pub fn rla(cpu: &mut Cpu, value: u8) -> u8 {
    let result = rol(cpu, value);
    and(cpu, result);
    result
}

/// LSR + EOR
pub fn sre(cpu: &mut Cpu, value: u8) -> u8 {
    let result = lsr(cpu, value);
    eor(cpu, result);
    result
}

/// ROR + ADC
pub fn rra(cpu: &mut Cpu, value: u8) -> u8 {
    let result = ror(cpu, value);
    adc(cpu, result);
    result
}

/// DEC + CMP
pub fn dcp(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    cpu.compare(cpu.a, result);
    result
}

/// INC + SBC
pub fn isb(cpu: &mut Cpu, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    sbc(cpu, result);
    result
}

// Branch conditions

pub fn bpl(cpu: &Cpu) -> bool {
    !cpu.status.negative
}

pub fn bmi(cpu: &Cpu) -> bool {
    cpu.status.negative
}

pub fn bvc(cpu: &Cpu) -> bool {
    !cpu.status.overflow
}

pub fn bvs(cpu: &Cpu) -> bool {
    cpu.status.overflow
}

pub fn bcc(cpu: &Cpu) -> bool {
    !cpu.status.carry
}

pub fn bcs(cpu: &Cpu) -> bool {
    cpu.status.carry
}

pub fn bne(cpu: &Cpu) -> bool {
    !cpu.status.zero
}

pub fn beq(cpu: &Cpu) -> bool {
    cpu.status.zero
}

// Stack operations

pub fn pha(cpu: &Cpu) -> u8 {
    cpu.a
}

pub fn php(cpu: &Cpu) -> u8 {
    cpu.status.to_stack(true)
}

pub fn pla(cpu: &mut Cpu, value: u8) {
    cpu.a = value;
    cpu.update_negative_zero_flags(value);
}

pub fn plp(cpu: &mut Cpu, value: u8) {
    cpu.status = super::StatusFlags::from_stack(value);
}
