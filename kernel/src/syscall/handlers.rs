//! Обработчики отдельных вызовов / Per-call handlers

use libbronze::abi::Syscall;

use super::{Console, SyscallArgs, SyscallError, UserMemory};
use crate::config::{INODE_DATA_SIZE, LIST_BUFFER_SIZE, SYSCALL_STR_MAX};
use crate::context::Kernel;

type Result<T> = core::result::Result<T, SyscallError>;

pub fn handle(
    call:    Syscall,
    kernel:  &mut Kernel,
    args:    SyscallArgs,
    user:    &mut dyn UserMemory,
    console: &mut dyn Console,
) -> Result<u32> {
    match call {
        Syscall::Write  => sys_write(args.arg1, user, console),
        Syscall::Open   => sys_open(kernel, args.arg1, user),
        Syscall::Exit   => sys_exit(kernel),
        Syscall::Ps     => Ok(kernel.live_units() as u32),
        Syscall::Kill   => sys_kill(kernel, args.arg1),
        Syscall::Read   => sys_read(kernel, args.arg1, args.arg2, args.arg3, user),
        Syscall::Close  => sys_close(kernel, args.arg1),
        Syscall::Create => sys_create(kernel, args.arg1, user),
        Syscall::List   => sys_list(kernel, args.arg1, args.arg2, user),
    }
}

fn read_string<'a>(user: &dyn UserMemory, ptr: u32, buf: &'a mut [u8]) -> Result<&'a [u8]> {
    if ptr == 0 {
        return Err(SyscallError::InvalidArgument);
    }
    let len = user.read_cstr(ptr, buf)?;
    Ok(&buf[..len])
}

fn sys_write(ptr: u32, user: &dyn UserMemory, console: &mut dyn Console) -> Result<u32> {
    let mut buf = [0u8; SYSCALL_STR_MAX];
    let text = read_string(user, ptr, &mut buf)?;
    console.write_bytes(text);
    Ok(0)
}

fn sys_open(kernel: &mut Kernel, ptr: u32, user: &dyn UserMemory) -> Result<u32> {
    let mut buf = [0u8; SYSCALL_STR_MAX];
    let name = read_string(user, ptr, &mut buf)?;
    Ok(kernel.vfs_mut().open(name)? as u32)
}

fn sys_create(kernel: &mut Kernel, ptr: u32, user: &dyn UserMemory) -> Result<u32> {
    let mut buf = [0u8; SYSCALL_STR_MAX];
    let name = read_string(user, ptr, &mut buf)?;
    Ok(kernel.vfs_mut().create(name)? as u32)
}

fn sys_exit(kernel: &mut Kernel) -> Result<u32> {
    kernel.exit_current();
    Ok(0)
}

fn sys_kill(kernel: &mut Kernel, pid: u32) -> Result<u32> {
    kernel.terminate(pid);
    Ok(0)
}

fn sys_read(
    kernel: &mut Kernel,
    fd:     u32,
    buf:    u32,
    len:    u32,
    user:   &mut dyn UserMemory,
) -> Result<u32> {
    if buf == 0 {
        return Err(SyscallError::InvalidArgument);
    }
    let mut chunk = [0u8; INODE_DATA_SIZE];
    let want = (len as usize).min(chunk.len());
    // Смещение двигается только если копия точно пройдёт
    // The offset moves only once the copy is known to succeed
    user.check_writable(buf, want)?;
    let n = kernel.vfs_mut().read(fd as usize, &mut chunk[..want])?;
    user.write_bytes(buf, &chunk[..n])?;
    Ok(n as u32)
}

fn sys_close(kernel: &mut Kernel, fd: u32) -> Result<u32> {
    kernel.vfs_mut().close(fd as usize);
    Ok(0)
}

fn sys_list(kernel: &mut Kernel, buf: u32, len_out: u32, user: &mut dyn UserMemory) -> Result<u32> {
    if buf == 0 || len_out == 0 {
        return Err(SyscallError::InvalidArgument);
    }
    user.check_writable(len_out, core::mem::size_of::<u32>())?;
    let mut out = [0u8; LIST_BUFFER_SIZE];
    // До инициализации - пустой список / Before init the list is empty
    let n = kernel.vfs().list(&mut out[..LIST_BUFFER_SIZE - 1]).unwrap_or(0);
    out[n] = 0;
    user.write_bytes(buf, &out[..=n])?;
    user.write_u32(len_out, n as u32)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::*;
    use crate::context::tests::kernel;
    use crate::sched::Privilege;
    use libbronze::abi::ERROR;

    /// Плоская «память пользователя» с адресами от 0x1000
    /// Flat "user memory" with addresses starting at 0x1000
    struct FakeMemory {
        bytes: Vec<u8>,
    }

    const BASE: u32 = 0x1000;

    impl FakeMemory {
        fn new() -> Self {
            Self { bytes: vec![0; 1024] }
        }

        fn put_str(&mut self, at: u32, s: &str) -> u32 {
            let off = (at - BASE) as usize;
            self.bytes[off..off + s.len()].copy_from_slice(s.as_bytes());
            self.bytes[off + s.len()] = 0;
            at
        }

        fn slice(&self, at: u32, len: usize) -> &[u8] {
            let off = (at - BASE) as usize;
            &self.bytes[off..off + len]
        }

        fn range(&self, ptr: u32, len: usize) -> Result<core::ops::Range<usize>> {
            let off = ptr.checked_sub(BASE).ok_or(SyscallError::InvalidArgument)? as usize;
            if off + len > self.bytes.len() {
                return Err(SyscallError::InvalidArgument);
            }
            Ok(off..off + len)
        }
    }

    impl UserMemory for FakeMemory {
        fn check_writable(&self, ptr: u32, len: usize) -> Result<()> {
            self.range(ptr, len).map(|_| ())
        }

        fn read_cstr(&self, ptr: u32, buf: &mut [u8]) -> Result<usize> {
            let start = self.range(ptr, 0)?.start;
            let mut n = 0;
            while n < buf.len() && start + n < self.bytes.len() && self.bytes[start + n] != 0 {
                buf[n] = self.bytes[start + n];
                n += 1;
            }
            Ok(n)
        }

        fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
            let r = self.range(ptr, bytes.len())?;
            self.bytes[r].copy_from_slice(bytes);
            Ok(())
        }

        fn write_u32(&mut self, ptr: u32, value: u32) -> Result<()> {
            self.write_bytes(ptr, &value.to_le_bytes())
        }
    }

    #[derive(Default)]
    struct FakeConsole(Vec<u8>);

    impl Console for FakeConsole {
        fn write_bytes(&mut self, bytes: &[u8]) {
            self.0.extend_from_slice(bytes);
        }
    }

    fn call(k: &mut Kernel, m: &mut FakeMemory, c: &mut FakeConsole, n: Syscall, a: [u32; 3]) -> i32 {
        dispatch(k, SyscallArgs::from_registers(n.number(), a[0], a[1], a[2]), m, c)
    }

    fn noop() {}

    #[test]
    fn write_goes_to_console() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        let s = m.put_str(0x1000, "Hello from user space!");
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Write, [s, 0, 0]), 0);
        assert_eq!(c.0, b"Hello from user space!");
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Write, [0, 0, 0]), ERROR);
    }

    #[test]
    fn file_round_trip_through_the_gate() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        let name = m.put_str(0x1000, "log.txt");

        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Create, [name, 0, 0]), 0);
        let fd = call(&mut k, &mut m, &mut c, Syscall::Open, [name, 0, 0]);
        assert_eq!(fd, 0);
        k.vfs_mut().write(fd as usize, b"abc").unwrap();
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Close, [fd as u32, 0, 0]), 0);

        let fd = call(&mut k, &mut m, &mut c, Syscall::Open, [name, 0, 0]) as u32;
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [fd, 0x1100, 64]), 3);
        assert_eq!(m.slice(0x1100, 3), b"abc");
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [fd, 0x1100, 64]), 0);
    }

    #[test]
    fn bad_read_buffer_keeps_the_offset() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        k.vfs_mut().create(b"abc").unwrap();
        let fd = k.vfs_mut().open(b"abc").unwrap();
        k.vfs_mut().write(fd, b"abc").unwrap();
        k.vfs_mut().close(fd);
        let fd = k.vfs_mut().open(b"abc").unwrap();

        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [fd as u32, 0x5000_0000, 3]), ERROR);
        // хвост буфера за пределами памяти / buffer tail past the end of memory
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [fd as u32, 0x1000 + 1022, 3]), ERROR);
        assert_eq!(k.vfs().descriptor(fd).unwrap().offset, 0);

        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [fd as u32, 0x1100, 3]), 3);
        assert_eq!(m.slice(0x1100, 3), b"abc");
    }

    #[test]
    fn list_with_bad_length_pointer_writes_nothing() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        k.vfs_mut().create(b"a").unwrap();
        m.bytes[0x200..0x204].fill(0xAA);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::List, [0x1200, 0x5000_0000, 0]), ERROR);
        assert_eq!(m.slice(0x1200, 4), &[0xAA; 4]);
    }

    #[test]
    fn vfs_errors_become_minus_one() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        let name = m.put_str(0x1000, "nope");
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Open, [name, 0, 0]), ERROR);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [7, 0x1100, 8]), ERROR);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Read, [0, 0, 8]), ERROR);
        // close на неверном fd всё равно 0 / close on a bad fd still returns 0
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Close, [99, 0, 0]), 0);
    }

    #[test]
    fn unknown_numbers_return_minus_one() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        for n in [0, 10, 0xFFFF_FFFF] {
            let args = SyscallArgs::from_registers(n, 0, 0, 0);
            assert_eq!(dispatch(&mut k, args, &mut m, &mut c), ERROR);
        }
    }

    #[test]
    fn list_writes_names_length_and_nul() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        k.vfs_mut().create(b"a").unwrap();
        k.vfs_mut().create(b"bb").unwrap();
        m.bytes[0x200..0x210].fill(0xAA);

        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::List, [0x1200, 0x1300, 0]), 0);
        assert_eq!(m.slice(0x1200, 6), b"a bb \0");
        assert_eq!(m.slice(0x1300, 4), &5u32.to_le_bytes());
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::List, [0x1200, 0, 0]), ERROR);
    }

    #[test]
    fn list_is_capped_below_buffer_size() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        for i in 0..8u8 {
            let name = [b'a' + i; 31];
            k.vfs_mut().create(&name).unwrap();
        }
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::List, [0x1000, 0x1200, 0]), 0);
        assert_eq!(m.slice(0x1200, 4), &255u32.to_le_bytes());
        assert_eq!(m.slice(0x1000 + 255, 1), b"\0");
    }

    #[test]
    fn ps_kill_and_exit() {
        let (mut k, mut m, mut c) = (kernel(), FakeMemory::new(), FakeConsole::default());
        k.create_unit(noop, 5, Privilege::Kernel).unwrap();
        k.create_unit(noop, 3, Privilege::Kernel).unwrap();
        k.create_unit(noop, 2, Privilege::User).unwrap();
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Ps, [0; 3]), 3);

        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Kill, [2, 0, 0]), 0);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Kill, [42, 0, 0]), 0);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Ps, [0; 3]), 2);

        assert_eq!(k.select(), Some(1));
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Exit, [0; 3]), 0);
        assert_eq!(call(&mut k, &mut m, &mut c, Syscall::Ps, [0; 3]), 1);
        assert_eq!(k.active_pid(), None);
    }
}
